//! # Search Indexes
//!
//! Built once after the address tree is sealed; strictly read-only on the
//! node table.
//!
//! - `alias`: curated rules producing alternative ancestor paths
//! - `labels`: phase 1, label -> node ids collection
//! - `trie`: phases 2 and 3 (`fst` trie + trie-id table) and the
//!   `LabelIndex` reader
//! - `note`: the same structure keyed by `key:value` note tokens

mod alias;
mod labels;
mod note;
mod trie;

pub use alias::{AliasRule, AliasTable, PathElement};
pub use labels::{LabelCollector, LabelMap, NodeIds};
pub use note::{build_note_index, collect_note_tokens, note_tokens};
pub use trie::{write_label_index, LabelIndex, TrieIndexBuilder};
