//! # Trie Index
//!
//! Phases 2 and 3 of index building, plus the reader used to query the
//! result.
//!
//! ## Artifacts
//!
//! ```text
//! address.trie             fst::Map  label -> trie_id
//! trie_node/page_NNN.bin   PagedTable<TrieNode>, position trie_id -> node ids
//! ```
//!
//! `trie_id` is the rank of the label in byte order, so ids are dense and
//! the trie and the table are written in one pass over the sorted labels.
//! The note index uses the same pair (`note.trie`, `note_node`).

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use fst::{Map, MapBuilder};
use memmap2::Mmap;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::alias::AliasTable;
use super::labels::{LabelCollector, LabelMap};
use crate::address::{AddressLevel, Standardizer};
use crate::config::{
    NOTE_NODE_TABLE, NOTE_TRIE_FILE, PAGE_CACHE_CAPACITY, TRIE_FILE, TRIE_NODE_TABLE,
};
use crate::error::DictError;
use crate::records::{AddressNode, TrieNode};
use crate::storage::{expect_len, PagedTable, TableOptions};

/// Builds `address.trie` and `trie_node` from a sealed address tree.
pub struct TrieIndexBuilder<'a> {
    collector: LabelCollector<'a>,
}

impl<'a> TrieIndexBuilder<'a> {
    pub fn new(
        standardizer: &'a dyn Standardizer,
        aliases: &AliasTable,
        cutoff: AddressLevel,
    ) -> Self {
        Self {
            collector: LabelCollector::new(standardizer, aliases, cutoff),
        }
    }

    /// Runs all three phases. Returns the number of distinct labels.
    pub fn build(
        &self,
        nodes: &PagedTable<AddressNode>,
        dict_dir: &Path,
        options: TableOptions,
    ) -> Result<u64> {
        let labels = self.collector.collect(nodes)?;
        let count = write_label_index(labels, dict_dir, TRIE_FILE, TRIE_NODE_TABLE, options)?;
        info!(labels = count, "address trie index written");
        Ok(count)
    }
}

/// Writes the trie file and its trie-id table from `labels`.
pub fn write_label_index(
    labels: LabelMap,
    dict_dir: &Path,
    trie_file: &str,
    table_name: &str,
    options: TableOptions,
) -> Result<u64> {
    let entries = labels.into_sorted();

    let mut builder = MapBuilder::memory();
    for (trie_id, (label, _)) in entries.iter().enumerate() {
        builder
            .insert(label.as_bytes(), trie_id as u64)
            .wrap_err_with(|| format!("failed to insert label '{}' into trie", label))?;
    }
    let trie_bytes = builder.into_inner().wrap_err("failed to finish trie")?;

    let trie_path = dict_dir.join(trie_file);
    let mut tmp = NamedTempFile::new_in(dict_dir)
        .wrap_err_with(|| format!("failed to create temp file in '{}'", dict_dir.display()))?;
    tmp.write_all(&trie_bytes).wrap_err("failed to write trie")?;
    tmp.persist(&trie_path)
        .wrap_err_with(|| format!("failed to replace '{}'", trie_path.display()))?;
    debug!(path = %trie_path.display(), bytes = trie_bytes.len(), "wrote trie");

    let mut table: PagedTable<TrieNode> = PagedTable::create(dict_dir, table_name, options)?;
    let total = entries.len() as u64;
    let mut chunk = Vec::with_capacity(options.page_size.min(entries.len()));

    for (trie_id, (_, ids)) in entries.into_iter().enumerate() {
        let trie_id = u32::try_from(trie_id).wrap_err("too many labels for u32 trie ids")?;
        chunk.push(TrieNode::new(trie_id, ids.into_vec()));
        if chunk.len() == options.page_size {
            table.append_records(&chunk)?;
            chunk.clear();
        }
    }
    table.append_records(&chunk)?;

    Ok(total)
}

/// Read side of a trie index.
pub struct LabelIndex {
    trie: Map<Mmap>,
    table: PagedTable<TrieNode>,
    trie_path: PathBuf,
}

impl LabelIndex {
    pub fn open(dict_dir: &Path, trie_file: &str, table_name: &str) -> Result<Self> {
        let trie_path = dict_dir.join(trie_file);
        let file = File::open(&trie_path)
            .wrap_err_with(|| format!("failed to open trie '{}'", trie_path.display()))?;

        // SAFETY: the dictionary directory is immutable once built; the trie
        // file is written to a temporary file and renamed into place, never
        // modified in place.
        let mmap = unsafe {
            Mmap::map(&file)
                .wrap_err_with(|| format!("failed to memory-map '{}'", trie_path.display()))?
        };
        let trie = Map::new(mmap)
            .map_err(|e| DictError::corruption(trie_file, format!("invalid trie: {}", e)))?;

        let table = PagedTable::open(dict_dir, table_name, PAGE_CACHE_CAPACITY)?;
        expect_len(&table, trie.len() as u64)?;

        Ok(Self {
            trie,
            table,
            trie_path,
        })
    }

    pub fn open_address(dict_dir: &Path) -> Result<Self> {
        Self::open(dict_dir, TRIE_FILE, TRIE_NODE_TABLE)
    }

    pub fn open_notes(dict_dir: &Path) -> Result<Self> {
        Self::open(dict_dir, NOTE_TRIE_FILE, NOTE_NODE_TABLE)
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    pub fn trie_id(&self, label: &str) -> Option<u64> {
        self.trie.get(label.as_bytes())
    }

    /// Node ids registered for exactly `label`; empty when unregistered.
    pub fn lookup(&self, label: &str) -> Result<Vec<u32>> {
        match self.trie_id(label) {
            Some(trie_id) => self.nodes(trie_id),
            None => Ok(Vec::new()),
        }
    }

    /// Every registered label that is a prefix of `text`, shortest first,
    /// with its node ids.
    pub fn prefixes(&self, text: &str) -> Result<Vec<(String, Vec<u32>)>> {
        let mut found = Vec::new();
        for end in text.char_indices().map(|(i, c)| i + c.len_utf8()) {
            let prefix = &text[..end];
            if let Some(trie_id) = self.trie_id(prefix) {
                found.push((prefix.to_string(), self.nodes(trie_id)?));
            }
        }
        Ok(found)
    }

    fn nodes(&self, trie_id: u64) -> Result<Vec<u32>> {
        let record = self.table.get_record(trie_id)?;
        if record.id as u64 != trie_id {
            return Err(DictError::corruption(
                self.table.name(),
                format!(
                    "position {} holds trie id {} (trie '{}')",
                    trie_id,
                    record.id,
                    self.trie_path.display()
                ),
            )
            .into());
        }
        Ok(record.nodes)
    }
}
