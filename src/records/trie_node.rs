//! Trie id to node id list, stored at position `id` of `trie_node` and
//! `note_node`.

use std::convert::Infallible;

use eyre::{ensure, Result, WrapErr};

use crate::encoding::codec::put_varint;
use crate::encoding::ByteReader;
use crate::storage::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieNode {
    pub id: u32,
    pub nodes: Vec<u32>,
}

impl TrieNode {
    pub fn new(id: u32, nodes: Vec<u32>) -> Self {
        Self { id, nodes }
    }
}

impl Record for TrieNode {
    const KIND: &'static str = "trie_node";
    const SCHEMA_VERSION: u32 = 1;
    const FIELDS: &'static [&'static str] = &["id:varint", "count:varint", "nodes:varint*"];

    type Field = Infallible;

    fn encode(&self, out: &mut Vec<u8>) {
        put_varint(out, self.id as u64);
        put_varint(out, self.nodes.len() as u64);
        for &node in &self.nodes {
            put_varint(out, node as u64);
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let id = r.varint_u32().wrap_err("id")?;
        let count = r.varint().wrap_err("count")? as usize;
        // Every id takes at least one byte.
        ensure!(
            count <= r.remaining(),
            "trie node {} claims {} ids in {} bytes",
            id,
            count,
            r.remaining()
        );

        let mut nodes = Vec::with_capacity(count);
        for _ in 0..count {
            nodes.push(r.varint_u32().wrap_err("nodes")?);
        }
        r.finish()?;
        Ok(Self { id, nodes })
    }

    fn apply(&mut self, field: &Infallible) {
        match *field {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reverses_encode() {
        let node = TrieNode::new(300, vec![1, 128, 70_000, u32::MAX]);
        let mut buf = Vec::new();
        node.encode(&mut buf);
        assert_eq!(TrieNode::decode(&buf).unwrap(), node);
    }

    #[test]
    fn oversized_count_is_rejected() {
        let mut buf = Vec::new();
        put_varint(&mut buf, 1);
        put_varint(&mut buf, 1_000);
        put_varint(&mut buf, 5);
        assert!(TrieNode::decode(&buf).is_err());
    }
}
