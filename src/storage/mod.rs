//! # Storage Module
//!
//! This module provides the paged record store every artifact of a
//! dictionary is written to. A table is a directory of page files plus a
//! JSON descriptor; pages are read through memory mappings and rewritten
//! whole, never modified in place.
//!
//! ## Store Directory
//!
//! ```text
//! dict_dir/
//! ├── address_node/        # Address tree (AddressNode)
//! │   ├── config.json
//! │   ├── page_000.bin
//! │   └── page_001.bin
//! ├── trie_node/           # trie id -> node ids (TrieNode)
//! ├── note_node/           # note trie id -> node ids (TrieNode)
//! ├── dataset/             # Provenance (DatasetRecord)
//! ├── address.trie         # fst map over address labels
//! └── note.trie            # fst map over note tokens
//! ```
//!
//! ## Page Lifecycle
//!
//! Pages are created on first append and stay rewritable until the build is
//! finished; sibling back-patches go through `PagedTable::update_records`.
//! After the build the directory is read-only.
//!
//! ## Page Cache
//!
//! Each table keeps at most `cache_capacity` pages mapped (default 10). The
//! cache is keyed by page path; eviction drops the `Arc<MappedPage>`, which
//! unmaps the region once no reader holds it.
//!
//! ## Module Organization
//!
//! - `page`: Page file format (`PageHeader`, `PageView`, `encode_page`)
//! - `mmap`: Read-only mapping of one page file (`MappedPage`)
//! - `cache`: LRU map used for mapped pages (`LruPageCache`)
//! - `descriptor`: Per-table JSON descriptor (`TableDescriptor`)
//! - `record`: The `Record` trait implemented by every stored type
//! - `table`: `PagedTable<R>`
//!
//! ## Thread Safety
//!
//! `PagedTable` reads take `&self` and may be shared; appends and updates
//! take `&mut self`. Building is single-threaded.

mod cache;
mod descriptor;
mod mmap;
pub mod page;
mod record;
mod table;

pub use cache::{CacheStats, LruPageCache};
pub use descriptor::TableDescriptor;
pub use mmap::MappedPage;
pub use page::{encode_page, PageHeader, PageView};
pub use record::Record;
pub use table::{expect_len, PagedTable, Records, TableOptions};
