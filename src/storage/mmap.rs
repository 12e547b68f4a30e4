//! # Memory-Mapped Page Files
//!
//! `MappedPage` owns a read-only mapping of one page file together with the
//! file descriptor it was created from. Dropping it unmaps the region and
//! closes the descriptor, which is what the page cache relies on when it
//! evicts an entry.
//!
//! ## Safety Considerations
//!
//! A mapping reflects the file it was created from. Page files are never
//! written in place: a rewrite goes to a temporary file that is renamed over
//! the old path, so an existing mapping keeps pointing at the old (complete)
//! inode. The table invalidates its cached mapping before the rename, which
//! is what guarantees that a rewritten page is never read through a stale
//! mapping.
//!
//! ## Error Handling
//!
//! Open failures carry the page path. Framing and checksum problems are
//! reported as plain errors; the table layer classifies them as store
//! corruption.

use std::fs::File;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use memmap2::Mmap;

use super::page::PageView;

#[derive(Debug)]
pub struct MappedPage {
    path: PathBuf,
    _file: File,
    mmap: Mmap,
    record_count: usize,
}

impl MappedPage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .wrap_err_with(|| format!("failed to open page file '{}'", path.display()))?;

        // SAFETY: Mmap::map is unsafe because the file could be modified while
        // mapped. This is safe because:
        // 1. Page files are only replaced by rename, never modified in place
        // 2. The owning table drops this mapping before it replaces the file
        // 3. The mapping lifetime is tied to MappedPage, and every access goes
        //    through PageView, which bounds-checks slots and record spans
        let mmap = unsafe {
            Mmap::map(&file)
                .wrap_err_with(|| format!("failed to memory-map '{}'", path.display()))?
        };

        let view = PageView::parse_verified(&mmap)
            .wrap_err_with(|| format!("invalid page file '{}'", path.display()))?;
        let record_count = view.record_count();

        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
            mmap,
            record_count,
        })
    }

    pub fn view(&self) -> Result<PageView<'_>> {
        PageView::parse(&self.mmap)
            .wrap_err_with(|| format!("invalid page file '{}'", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DatasetRecord;
    use crate::storage::page::encode_page;
    use tempfile::tempdir;

    #[test]
    fn maps_a_written_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page_000.bin");
        let records = vec![
            DatasetRecord::new(1, "a", "u1"),
            DatasetRecord::new(2, "b", "u2"),
        ];
        std::fs::write(&path, encode_page(&records).unwrap()).unwrap();

        let page = MappedPage::open(&path).unwrap();

        assert_eq!(page.record_count(), 2);
        let bytes = page.view().unwrap().record_bytes(1).unwrap();
        assert_eq!(
            <DatasetRecord as crate::storage::Record>::decode(bytes).unwrap(),
            records[1]
        );
    }

    #[test]
    fn open_fails_for_nonexistent_file() {
        let dir = tempdir().unwrap();
        assert!(MappedPage::open(dir.path().join("page_404.bin")).is_err());
    }

    #[test]
    fn open_fails_for_damaged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page_000.bin");
        let mut image = encode_page(&[DatasetRecord::new(1, "a", "u")]).unwrap();
        let last = image.len() - 1;
        image[last] ^= 0x01;
        std::fs::write(&path, image).unwrap();

        let err = MappedPage::open(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("checksum"));
    }
}
