//! # geodict - Hierarchical Address Dictionary Builder
//!
//! geodict builds an immutable, on-disk address dictionary from millions of
//! normalized address lines. The result is a tree of address nodes stored in
//! memory-mapped page files, plus a static trie that finds nodes by full or
//! partial address text.
//!
//! - **Paged record store**: append, random read and sparse patching over
//!   page files read through a bounded LRU cache of mappings
//! - **Sort-merge tree build**: external sort per region, then a single pass
//!   that assigns ids, parent links and (deferred) sibling links
//! - **Trie index**: every suffix of every ancestor path, alias variants and
//!   spelling variants, compiled into an `fst` map
//!
//! ## Quick Start
//!
//! ```ignore
//! use geodict::{BuildOptions, DatasetRecord, DictionaryBuilder, LabelIndex};
//!
//! let mut builder = DictionaryBuilder::create("./dict", BuildOptions::new())?;
//! builder.add_text_dir_region("./text", "13")?;
//! builder.finish(&[DatasetRecord::new(1, "市区町村", "https://example.org")])?;
//!
//! let index = LabelIndex::open_address("./dict".as_ref())?;
//! let ids = index.lookup("渋谷区道玄坂")?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │       DictionaryBuilder (build)           │
//! ├────────────────────┬─────────────────────┤
//! │ SortMergeStager    │ TrieIndexBuilder     │
//! │ TreeBuilder        │ (index)              │
//! ├────────────────────┴─────────────────────┤
//! │     Record layouts (records, encoding)    │
//! ├──────────────────────────────────────────┤
//! │  PagedTable: pages, mmap, LRU (storage)   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: stager -> tree builder -> node table -> index
//! builder. Nothing downstream modifies an upstream output.
//!
//! ## Dictionary Layout
//!
//! ```text
//! dict_dir/
//! ├── address_node/        # config.json + page_NNN.bin
//! ├── trie_node/
//! ├── note_node/
//! ├── dataset/
//! ├── address.trie
//! └── note.trie
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: Constants shared by every layer
//! - [`error`]: `DictError` failure taxonomy
//! - [`encoding`]: Varints and the record field codec
//! - [`storage`]: Page format, mappings, cache, `PagedTable`
//! - [`records`]: `AddressNode`, `TrieNode`, `DatasetRecord`
//! - [`address`]: Input line model, parser, standardization
//! - [`build`]: Stager, tree builder, build session
//! - [`index`]: Alias rules, label collection, trie index
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`info` per region and phase, `debug`
//! for page writes, cache evictions, fix-ups and dropped duplicates). No
//! subscriber is installed.

pub mod address;
pub mod build;
pub mod config;
pub mod encoding;
pub mod error;
pub mod index;
pub mod records;
pub mod storage;

pub use address::{AddressElement, AddressLevel, NfkcStandardizer, NormalizedLine, Standardizer};
pub use build::{BuildOptions, BuildSummary, DictionaryBuilder, RegionSummary};
pub use error::DictError;
pub use index::{AliasRule, AliasTable, LabelIndex};
pub use records::{AddressNode, DatasetRecord, TrieNode};
pub use storage::{PagedTable, TableOptions};
