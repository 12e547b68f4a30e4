//! # Label Collection
//!
//! Phase 1 of index building: walk the address tree in id order and collect
//! every label that should lead to each node.
//!
//! For a node with standardized ancestor path `P1 / P2 / ... / Pn` (itself
//! last), each alias expansion of the path contributes all of its suffix
//! truncations, concatenated without separators:
//!
//! ```text
//! 東京都 / 渋谷区 / 道玄坂   ->   東京都渋谷区道玄坂
//!                                  渋谷区道玄坂
//!                                  道玄坂
//! ```
//!
//! Spelling variants of the last element of each expanded path (from the
//! standardizer) are registered the same way with that element replaced, so
//! a trimmed name gets its variants too.
//!
//! The walk keeps the ancestor chain in an explicit stack; since ids are in
//! pre-order, popping until the top is the node's parent restores the chain
//! for every node. Nodes finer than the cutoff level are skipped together
//! with their subtrees.
//!
//! The whole label map is held in memory until it is written out. That is
//! the memory bound of index building.

use eyre::Result;
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::debug;

use super::alias::{AliasTable, PathElement};
use crate::address::{AddressLevel, Standardizer};
use crate::config::ROOT_ID;
use crate::error::DictError;
use crate::records::AddressNode;
use crate::storage::PagedTable;

/// Node ids registered for one label, ascending.
pub type NodeIds = SmallVec<[u32; 4]>;

#[derive(Debug, Default)]
pub struct LabelMap {
    map: HashMap<String, NodeIds>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` under `label`. Ids must be registered in
    /// non-decreasing order; repeats are ignored.
    pub fn register(&mut self, label: String, id: u32) {
        let ids = self.map.entry(label).or_default();
        if ids.last() != Some(&id) {
            ids.push(id);
        }
    }

    pub fn get(&self, label: &str) -> Option<&[u32]> {
        self.map.get(label).map(|ids| ids.as_slice())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Consumes the map, returning entries in byte order of the label.
    pub fn into_sorted(self) -> Vec<(String, NodeIds)> {
        let mut entries: Vec<_> = self.map.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

pub struct LabelCollector<'a> {
    standardizer: &'a dyn Standardizer,
    aliases: AliasTable,
    cutoff: AddressLevel,
}

impl<'a> LabelCollector<'a> {
    pub fn new(
        standardizer: &'a dyn Standardizer,
        aliases: &AliasTable,
        cutoff: AddressLevel,
    ) -> Self {
        Self {
            standardizer,
            aliases: aliases.standardized(standardizer),
            cutoff,
        }
    }

    pub fn collect(&self, nodes: &PagedTable<AddressNode>) -> Result<LabelMap> {
        let mut labels = LabelMap::new();
        let mut stack: Vec<(u32, PathElement)> = Vec::new();
        let mut visited = 0u64;

        for node in nodes.iter() {
            let node = node?;
            if node.is_root() {
                continue;
            }

            let level = AddressLevel::from_u8(node.level).ok_or_else(|| {
                DictError::corruption(
                    nodes.name(),
                    format!("node {} has invalid level {}", node.id, node.level),
                )
            })?;
            if level > self.cutoff {
                continue;
            }

            while stack.last().is_some_and(|(id, _)| *id != node.parent_id) {
                stack.pop();
            }
            if stack.is_empty() && node.parent_id != ROOT_ID {
                return Err(DictError::corruption(
                    nodes.name(),
                    format!(
                        "node {} names parent {} outside its ancestor chain",
                        node.id, node.parent_id
                    ),
                )
                .into());
            }

            stack.push((node.id, PathElement::new(level, &node.name_index)));
            let path: Vec<PathElement> = stack.iter().map(|(_, e)| e.clone()).collect();
            self.register_path(&mut labels, &path, node.id);
            visited += 1;
        }

        debug!(nodes = visited, labels = labels.len(), "collected address labels");
        Ok(labels)
    }

    fn register_path(&self, labels: &mut LabelMap, path: &[PathElement], id: u32) {
        for expanded in self.aliases.expand(path) {
            register_truncations(labels, &expanded, id);

            let Some(own) = expanded.last() else {
                continue;
            };
            for variant in self.standardizer.variants(&own.name) {
                let mut alternative = expanded.clone();
                if let Some(last) = alternative.last_mut() {
                    last.name = variant;
                }
                register_truncations(labels, &alternative, id);
            }
        }
    }
}

fn register_truncations(labels: &mut LabelMap, path: &[PathElement], id: u32) {
    for start in 0..path.len() {
        let label: String = path[start..].iter().map(|e| e.name.as_str()).collect();
        labels.register(label, id);
    }
}
