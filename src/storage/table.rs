//! # Paged Tables
//!
//! `PagedTable<R>` is an append-only array of records split into page files
//! of `page_size` records each. Position `pos` lives in page
//! `pos / page_size` at slot `pos % page_size`.
//!
//! ## Access Paths
//!
//! | Operation          | Path                                             |
//! |--------------------|--------------------------------------------------|
//! | `append_records`   | encode whole pages, rewrite a partial tail page  |
//! | `get_record`       | LRU cache of mapped pages, decode one slot       |
//! | `update_records`   | read page, decode all, patch, rewrite            |
//! | `retrieve_records` | sequential `get_record` over a position range    |
//!
//! Reads take `&self`; the page cache sits behind a `parking_lot::Mutex` so a
//! sealed table can be shared between readers. Writes take `&mut self`.
//!
//! ## Stale Mappings
//!
//! Every page write removes the page from the cache before the new file is
//! renamed into place. Combined with rename-based replacement this means a
//! mapping handed out before the write still sees the old complete page, and
//! every lookup after the write maps the new one.
//!
//! ## Failure Modes
//!
//! Reading a position at or past `len()`, a missing page file, or a page that
//! fails framing/checksum validation all produce
//! `DictError::StoreCorruption`. No default record is ever returned.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{bail, ensure, Result, WrapErr};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use super::cache::{CacheStats, LruPageCache};
use super::descriptor::TableDescriptor;
use super::mmap::MappedPage;
use super::page::{encode_page, PageView};
use super::Record;
use crate::config::{DESCRIPTOR_FILE, MIN_PAGE_CACHE_CAPACITY, PAGE_CACHE_CAPACITY, PAGE_SIZE};
use crate::error::DictError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub page_size: usize,
    pub cache_capacity: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            cache_capacity: PAGE_CACHE_CAPACITY,
        }
    }
}

impl TableOptions {
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

pub struct PagedTable<R: Record> {
    name: String,
    dir: PathBuf,
    descriptor: TableDescriptor,
    cache: Mutex<LruPageCache<PathBuf, Arc<MappedPage>>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PagedTable<R> {
    /// Creates an empty table at `db_dir/name`, replacing any table that was
    /// there before.
    pub fn create<P: AsRef<Path>>(db_dir: P, name: &str, options: TableOptions) -> Result<Self> {
        ensure!(options.page_size > 0, "page size must be positive");
        ensure!(
            options.page_size <= u32::MAX as usize,
            "page size {} exceeds the per-page slot limit",
            options.page_size
        );

        let dir = db_dir.as_ref().join(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .wrap_err_with(|| format!("failed to remove old table '{}'", dir.display()))?;
        }
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("failed to create table directory '{}'", dir.display()))?;

        let descriptor = TableDescriptor::new::<R>(name, options.page_size);
        descriptor.save(dir.join(DESCRIPTOR_FILE))?;

        debug!(table = name, page_size = options.page_size, "created paged table");

        Ok(Self::with_descriptor(name, dir, descriptor, options.cache_capacity))
    }

    pub fn open<P: AsRef<Path>>(db_dir: P, name: &str, cache_capacity: usize) -> Result<Self> {
        let dir = db_dir.as_ref().join(name);
        let descriptor = TableDescriptor::load(dir.join(DESCRIPTOR_FILE))
            .wrap_err_with(|| format!("failed to open table '{}'", name))?;
        descriptor.check_compatible::<R>()?;

        Ok(Self::with_descriptor(name, dir, descriptor, cache_capacity))
    }

    fn with_descriptor(
        name: &str,
        dir: PathBuf,
        descriptor: TableDescriptor,
        cache_capacity: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            dir,
            descriptor,
            cache: Mutex::new(LruPageCache::new(
                cache_capacity.max(MIN_PAGE_CACHE_CAPACITY),
            )),
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn len(&self) -> u64 {
        self.descriptor.length
    }

    pub fn is_empty(&self) -> bool {
        self.descriptor.length == 0
    }

    pub fn page_size(&self) -> usize {
        self.descriptor.page_size
    }

    pub fn page_count(&self) -> u64 {
        self.len().div_ceil(self.page_size() as u64)
    }

    pub fn page_path(&self, page_index: u64) -> PathBuf {
        self.dir.join(format!("page_{:03}.bin", page_index))
    }

    /// Returns `(page_index, slot)` for a position.
    pub fn locate(&self, pos: u64) -> (u64, usize) {
        let page_size = self.page_size() as u64;
        (pos / page_size, (pos % page_size) as usize)
    }

    /// Appends `records` at positions `len(), len() + 1, ...`.
    ///
    /// Full pages are written once. When the current tail page is partial it
    /// is read back and rewritten together with the new records.
    pub fn append_records(&mut self, records: &[R]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let page_size = self.page_size();
        let mut pos = self.len();
        let mut remaining = records;

        while !remaining.is_empty() {
            let (page_index, slot) = self.locate(pos);
            let take = (page_size - slot).min(remaining.len());
            let (chunk, rest) = remaining.split_at(take);

            let page_records = if slot == 0 {
                chunk.to_vec()
            } else {
                let mut existing = self.load_page(page_index)?;
                if existing.len() != slot {
                    return Err(self.corruption(format!(
                        "tail page {} holds {} records, descriptor expects {}",
                        page_index,
                        existing.len(),
                        slot
                    )));
                }
                existing.extend_from_slice(chunk);
                existing
            };

            self.write_page(page_index, &page_records)?;
            pos += take as u64;
            remaining = rest;
        }

        self.descriptor.length = pos;
        self.descriptor.save(self.dir.join(DESCRIPTOR_FILE))?;
        Ok(())
    }

    /// Reads the record at `pos` through the mapped page cache.
    pub fn get_record(&self, pos: u64) -> Result<R> {
        if pos >= self.len() {
            return Err(self.corruption(format!(
                "position {} out of range (count={})",
                pos,
                self.len()
            )));
        }

        let (page_index, slot) = self.locate(pos);
        let page = self.mapped_page(page_index)?;

        let bytes = page
            .view()
            .and_then(|view| view.record_bytes(slot))
            .map_err(|e| self.corruption(format!("page {}: {:#}", page_index, e)))?;

        R::decode(bytes).map_err(|e| {
            self.corruption(format!(
                "failed to decode position {} (page {}, slot {}): {:#}",
                pos, page_index, slot, e
            ))
        })
    }

    /// Applies sparse field changes. Positions are grouped by page; every
    /// affected page is decoded fully, patched and rewritten once.
    pub fn update_records(&mut self, updates: &BTreeMap<u64, Vec<R::Field>>) -> Result<()> {
        let mut by_page: BTreeMap<u64, Vec<(usize, &[R::Field])>> = BTreeMap::new();
        for (&pos, fields) in updates {
            if pos >= self.len() {
                return Err(self.corruption(format!(
                    "update targets position {} past count {}",
                    pos,
                    self.len()
                )));
            }
            let (page_index, slot) = self.locate(pos);
            by_page
                .entry(page_index)
                .or_default()
                .push((slot, fields.as_slice()));
        }

        for (page_index, patches) in by_page {
            let mut records = self.load_page(page_index)?;
            for (slot, fields) in patches {
                let Some(record) = records.get_mut(slot) else {
                    return Err(self.corruption(format!(
                        "page {} has no slot {}",
                        page_index, slot
                    )));
                };
                for field in fields {
                    record.apply(field);
                }
            }
            self.write_page(page_index, &records)?;
            debug!(table = %self.name, page_index, "rewrote page after update");
        }

        Ok(())
    }

    /// Iterates over up to `limit` records starting at `offset`.
    pub fn retrieve_records(&self, offset: u64, limit: u64) -> Records<'_, R> {
        let end = offset.saturating_add(limit).min(self.len());
        Records {
            table: self,
            next: offset,
            end,
        }
    }

    pub fn iter(&self) -> Records<'_, R> {
        self.retrieve_records(0, self.len())
    }

    /// Unmaps every cached page.
    pub fn evict_cached_pages(&self) {
        self.cache.lock().clear();
    }

    pub fn cached_page_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Hit, miss, eviction and invalidation counts of the page cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    fn mapped_page(&self, page_index: u64) -> Result<Arc<MappedPage>> {
        let path = self.page_path(page_index);
        let mut cache = self.cache.lock();

        if let Some(page) = cache.get(&path) {
            return Ok(Arc::clone(page));
        }

        let page = MappedPage::open(&path)
            .map(Arc::new)
            .map_err(|e| self.corruption(format!("page {}: {:#}", page_index, e)))?;

        if let Some((evicted, _)) = cache.insert(path, Arc::clone(&page)) {
            let stats = cache.stats();
            debug!(
                table = %self.name,
                evicted = %evicted.display(),
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                "evicted page mapping"
            );
        }

        Ok(page)
    }

    fn load_page(&self, page_index: u64) -> Result<Vec<R>> {
        let path = self.page_path(page_index);
        let image = fs::read(&path).map_err(|e| {
            self.corruption(format!("failed to read '{}': {}", path.display(), e))
        })?;

        PageView::parse_verified(&image)
            .and_then(|view| view.decode_all::<R>())
            .map_err(|e| self.corruption(format!("page {}: {:#}", page_index, e)))
    }

    fn write_page(&self, page_index: u64, records: &[R]) -> Result<()> {
        let path = self.page_path(page_index);
        let image = encode_page(records)
            .wrap_err_with(|| format!("failed to encode page {} of '{}'", page_index, self.name))?;

        self.cache.lock().invalidate(&path);

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .wrap_err_with(|| format!("failed to create temp file in '{}'", self.dir.display()))?;
        tmp.write_all(&image)
            .wrap_err_with(|| format!("failed to write page {}", page_index))?;
        tmp.persist(&path)
            .wrap_err_with(|| format!("failed to replace '{}'", path.display()))?;

        debug!(
            table = %self.name,
            page_index,
            records = records.len(),
            bytes = image.len(),
            "wrote page"
        );
        Ok(())
    }

    fn corruption(&self, detail: String) -> eyre::Report {
        DictError::corruption(&self.name, detail).into()
    }
}

impl<R: Record> std::fmt::Debug for PagedTable<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedTable")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("len", &self.len())
            .field("page_size", &self.page_size())
            .finish()
    }
}

/// Sequential scan over a position range of a [`PagedTable`].
pub struct Records<'a, R: Record> {
    table: &'a PagedTable<R>,
    next: u64,
    end: u64,
}

impl<R: Record> Iterator for Records<'_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let pos = self.next;
        self.next += 1;
        Some(self.table.get_record(pos))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl<R: Record> ExactSizeIterator for Records<'_, R> {}

/// Checks that `table` holds exactly `expected` records, for callers that
/// opened a table produced by another step.
pub fn expect_len<R: Record>(table: &PagedTable<R>, expected: u64) -> Result<()> {
    if table.len() != expected {
        bail!(DictError::corruption(
            table.name(),
            format!("expected {} records, found {}", expected, table.len())
        ));
    }
    Ok(())
}
