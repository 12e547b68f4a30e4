//! # Stored Record Types
//!
//! Fixed, versioned binary layouts for the three kinds of table a
//! dictionary holds. Every layout is a plain concatenation of codec fields
//! (see `encoding::codec`); trailing bytes after the last field are rejected.
//!
//! | Type            | Table                     | Patched after creation |
//! |-----------------|---------------------------|------------------------|
//! | `AddressNode`   | `address_node`            | `sibling_id` only      |
//! | `TrieNode`      | `trie_node`, `note_node`  | no                     |
//! | `DatasetRecord` | `dataset`                 | no                     |

mod address_node;
mod dataset;
mod trie_node;

pub use address_node::{AddressNode, NodeField};
pub use dataset::DatasetRecord;
pub use trie_node::TrieNode;
