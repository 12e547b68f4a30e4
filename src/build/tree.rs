//! # Tree Builder
//!
//! Folds a sorted stream of address lines into the `address_node` table.
//! Nodes are numbered in first-introduction order, which for sorted input is
//! depth-first pre-order: every subtree occupies a contiguous id range.
//!
//! ## State
//!
//! ```text
//! open:    [(東京都;1, 1), (渋谷区;3, 2), (道玄坂;5, 3)]   chain of the previous line
//! cur_id:  3                                            last allocated id
//! buffer:  nodes [buffer_start ..= cur_id] not yet written
//! fixups:  sibling patches for nodes already written to the table
//! ```
//!
//! ## Per Line
//!
//! 1. `d` = number of leading segments shared with the open chain. If the
//!    whole line is shared it is a duplicate and is dropped.
//! 2. Every open node past depth `d` has finished its subtree: its
//!    `sibling_id` becomes `cur_id + 1`. Nodes still in the buffer are
//!    patched in place; flushed ones get a queued fix-up.
//! 3. Elements `d..n` become new nodes, each the parent of the next.
//!
//! ## Fix-ups
//!
//! A patched node may already sit in a written page when the buffer was
//! flushed between its creation and the end of its subtree. Those patches
//! are queued as `(position, NodeField::SiblingId)` and applied in one
//! `update_records` pass at the end of each region and at `finish`.
//!
//! The buffer is flushed every `page_size` nodes, so each page is written
//! exactly once by `append_records` and at most rewritten by fix-up passes.

use std::collections::BTreeMap;

use eyre::{ensure, Result};
use tracing::debug;

use crate::address::NormalizedLine;
use crate::config::{MAX_NODE_ID, ROOT_ID, UNRESOLVED_SIBLING};
use crate::error::DictError;
use crate::records::{AddressNode, NodeField};
use crate::storage::PagedTable;

/// Counters reported by [`TreeBuilder::finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub lines: u64,
    pub duplicates: u64,
    pub nodes: u64,
    pub fixups: u64,
}

pub struct TreeBuilder {
    store: PagedTable<AddressNode>,
    open: Vec<(String, u32)>,
    prev_key: Vec<String>,
    cur_id: u32,
    buffer: Vec<AddressNode>,
    buffer_start: u32,
    fixups: BTreeMap<u64, Vec<NodeField>>,
    stats: TreeStats,
}

impl TreeBuilder {
    /// Starts a tree in an empty table. The root is allocated immediately.
    pub fn new(store: PagedTable<AddressNode>) -> Result<Self> {
        ensure!(
            store.is_empty(),
            "tree builder needs an empty table, '{}' holds {} records",
            store.name(),
            store.len()
        );

        let mut builder = Self {
            buffer: Vec::with_capacity(store.page_size().min(1 << 16)),
            store,
            open: Vec::new(),
            prev_key: Vec::new(),
            cur_id: ROOT_ID,
            buffer_start: ROOT_ID,
            fixups: BTreeMap::new(),
            stats: TreeStats::default(),
        };
        builder.push_node(AddressNode::root())?;
        Ok(builder)
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Number of nodes allocated so far, root included.
    pub fn node_count(&self) -> u64 {
        self.cur_id as u64 + 1
    }

    /// Adds one line whose standardized key is `segments`.
    ///
    /// Lines must arrive in key order within a region; a key smaller than
    /// the previous one is `DictError::UnsortedInput`.
    pub fn add_line(&mut self, segments: &[String], line: &NormalizedLine) -> Result<()> {
        ensure!(
            !segments.is_empty() && segments.len() == line.elements.len(),
            "key has {} segments for {} elements",
            segments.len(),
            line.elements.len()
        );

        if segments < self.prev_key.as_slice() {
            return Err(DictError::UnsortedInput {
                previous: self.prev_key.join(","),
                current: segments.join(","),
            }
            .into());
        }
        self.stats.lines += 1;

        let depth = self
            .open
            .iter()
            .zip(segments)
            .take_while(|((open_key, _), key)| open_key == *key)
            .count();

        if depth == segments.len() {
            self.stats.duplicates += 1;
            debug!(key = %segments.join(","), "dropped duplicate address");
            return Ok(());
        }

        self.close_open_from(depth);

        let mut parent_id = match depth {
            0 => ROOT_ID,
            _ => self.open[depth - 1].1,
        };

        let last = segments.len() - 1;
        let elements = segments.iter().zip(&line.elements).enumerate();
        for (i, (segment, element)) in elements.skip(depth) {
            let id = self.allocate_id()?;

            let name_index = segment
                .rsplit_once(';')
                .map_or(segment.as_str(), |(name, _)| name);

            self.push_node(AddressNode {
                id,
                name: element.name.clone(),
                name_index: name_index.to_string(),
                x: line.x,
                y: line.y,
                level: element.level.get(),
                priority: line.priority,
                note: if i == last {
                    line.note.clone()
                } else {
                    String::new()
                },
                parent_id,
                sibling_id: UNRESOLVED_SIBLING,
            })?;

            self.open.push((segment.clone(), id));
            parent_id = id;
        }

        self.prev_key.clear();
        self.prev_key.extend_from_slice(segments);
        Ok(())
    }

    /// Closes every open node and applies queued fix-ups. Called at the end
    /// of each independently sorted region; the next region starts a fresh
    /// key order.
    pub fn close_region(&mut self) -> Result<()> {
        self.close_open_from(0);
        self.prev_key.clear();
        self.apply_fixups()
    }

    /// Closes the tree, writes the remaining buffer and resolves every
    /// fix-up. The root's sibling becomes the final node count.
    pub fn finish(mut self) -> Result<(PagedTable<AddressNode>, TreeStats)> {
        self.close_region()?;

        let end = self.cur_id + 1;
        self.set_sibling(ROOT_ID, end);
        self.flush_buffer()?;
        self.apply_fixups()?;

        self.stats.nodes = self.store.len();
        debug!(nodes = self.stats.nodes, "address tree sealed");
        Ok((self.store, self.stats))
    }

    fn allocate_id(&mut self) -> Result<u32> {
        ensure!(
            self.cur_id < MAX_NODE_ID,
            "node id space exhausted after {} nodes",
            self.node_count()
        );
        self.cur_id += 1;
        Ok(self.cur_id)
    }

    fn close_open_from(&mut self, depth: usize) {
        if self.open.len() <= depth {
            return;
        }
        // cur_id <= MAX_NODE_ID, so this stays within u32.
        let sibling = self.cur_id + 1;
        let closed: Vec<u32> = self.open.drain(depth..).map(|(_, id)| id).collect();
        for id in closed {
            self.set_sibling(id, sibling);
        }
    }

    fn set_sibling(&mut self, target: u32, sibling: u32) {
        if target >= self.buffer_start {
            if let Some(node) = self.buffer.get_mut((target - self.buffer_start) as usize) {
                node.sibling_id = sibling;
                return;
            }
        }
        self.fixups
            .entry(target as u64)
            .or_default()
            .push(NodeField::SiblingId(sibling));
    }

    fn push_node(&mut self, node: AddressNode) -> Result<()> {
        self.buffer.push(node);
        if self.buffer.len() >= self.store.page_size() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.store.append_records(&self.buffer)?;
        self.buffer_start += self.buffer.len() as u32;
        self.buffer.clear();
        Ok(())
    }

    fn apply_fixups(&mut self) -> Result<()> {
        if self.fixups.is_empty() {
            return Ok(());
        }

        let written = self.store.len();
        if let Some((&target, _)) = self.fixups.range(written..).next() {
            return Err(DictError::FixupUnresolved {
                target,
                detail: format!("only {} nodes have been written", written),
            }
            .into());
        }

        let fixups = std::mem::take(&mut self.fixups);
        self.stats.fixups += fixups.len() as u64;
        debug!(count = fixups.len(), "applying sibling fix-ups");
        self.store.update_records(&fixups)
    }
}
