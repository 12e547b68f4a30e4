//! # Table Descriptor
//!
//! Each table directory carries a small JSON descriptor next to its page
//! files:
//!
//! ```text
//! address_node/
//! ├── config.json      # TableDescriptor
//! ├── page_000.bin
//! ├── page_001.bin
//! └── ...
//! ```
//!
//! ```json
//! {
//!   "table": "address_node",
//!   "record_kind": "address_node",
//!   "schema_version": 1,
//!   "format_version": 1,
//!   "page_size": 500000,
//!   "length": 1234567,
//!   "fields": ["id:varint", "name:str", "..."]
//! }
//! ```
//!
//! `length` is the number of records appended so far. It is rewritten after
//! every append, so a reader never sees a count that includes records whose
//! page has not been written yet.

use std::fs;
use std::io::Write;
use std::path::Path;

use eyre::{ensure, Result, WrapErr};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::Record;
use crate::config::FORMAT_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub table: String,
    pub record_kind: String,
    pub schema_version: u32,
    pub format_version: u32,
    pub page_size: usize,
    pub length: u64,
    pub fields: Vec<String>,
}

impl TableDescriptor {
    pub fn new<R: Record>(table: &str, page_size: usize) -> Self {
        Self {
            table: table.to_string(),
            record_kind: R::KIND.to_string(),
            schema_version: R::SCHEMA_VERSION,
            format_version: FORMAT_VERSION,
            page_size,
            length: 0,
            fields: R::FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .wrap_err_with(|| format!("failed to read table descriptor '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .wrap_err_with(|| format!("failed to parse table descriptor '{}'", path.display()))
    }

    /// Writes the descriptor atomically (temporary file + rename).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let json = serde_json::to_vec_pretty(self).wrap_err("failed to serialize descriptor")?;
        let mut tmp = NamedTempFile::new_in(dir)
            .wrap_err_with(|| format!("failed to create temp file in '{}'", dir.display()))?;
        tmp.write_all(&json)
            .wrap_err("failed to write table descriptor")?;
        tmp.persist(path)
            .wrap_err_with(|| format!("failed to replace '{}'", path.display()))?;
        Ok(())
    }

    pub fn check_compatible<R: Record>(&self) -> Result<()> {
        ensure!(
            self.record_kind == R::KIND,
            "table '{}' holds '{}' records, expected '{}'",
            self.table,
            self.record_kind,
            R::KIND
        );
        ensure!(
            self.schema_version == R::SCHEMA_VERSION,
            "table '{}' has schema version {}, expected {}",
            self.table,
            self.schema_version,
            R::SCHEMA_VERSION
        );
        ensure!(
            self.format_version == FORMAT_VERSION,
            "table '{}' has page format version {}, expected {}",
            self.table,
            self.format_version,
            FORMAT_VERSION
        );
        ensure!(self.page_size > 0, "table '{}' has page size 0", self.table);
        Ok(())
    }
}
