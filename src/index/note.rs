//! # Note Index
//!
//! Notes carry source identifiers such as `aza_id:0001001` or
//! `postcode:1500002`, several of them joined with `/`. Every `key:value`
//! token is indexed to the nodes carrying it, so a node can be found again by
//! its registry code. Tokens without a key or value are not indexed.
//!
//! The index is written with the same machinery as the address trie:
//! `note.trie` plus the `note_node` table.

use std::path::Path;

use eyre::Result;
use tracing::info;

use super::labels::LabelMap;
use super::trie::write_label_index;
use crate::config::{NOTE_NODE_TABLE, NOTE_TRIE_FILE};
use crate::records::AddressNode;
use crate::storage::{PagedTable, TableOptions};

/// `key:value` tokens of a note, in order of appearance.
pub fn note_tokens(note: &str) -> impl Iterator<Item = &str> {
    note.split('/').map(str::trim).filter(|token| {
        token
            .split_once(':')
            .is_some_and(|(key, value)| !key.is_empty() && !value.is_empty())
    })
}

pub fn collect_note_tokens(nodes: &PagedTable<AddressNode>) -> Result<LabelMap> {
    let mut tokens = LabelMap::new();
    for node in nodes.iter() {
        let node = node?;
        for token in note_tokens(&node.note) {
            tokens.register(token.to_string(), node.id);
        }
    }
    Ok(tokens)
}

/// Builds `note.trie` and `note_node`. Returns the number of distinct tokens.
pub fn build_note_index(
    nodes: &PagedTable<AddressNode>,
    dict_dir: &Path,
    options: TableOptions,
) -> Result<u64> {
    let tokens = collect_note_tokens(nodes)?;
    let count = write_label_index(tokens, dict_dir, NOTE_TRIE_FILE, NOTE_NODE_TABLE, options)?;
    info!(tokens = count, "note index written");
    Ok(count)
}
