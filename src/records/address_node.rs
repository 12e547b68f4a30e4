//! # Address Nodes
//!
//! One node per distinct address prefix. Node `id` is also its position in
//! the `address_node` table, and position 0 is the nameless virtual root.
//!
//! ## Tree Links
//!
//! Nodes are stored in depth-first pre-order, so a node's subtree is the
//! contiguous id range `(id, sibling_id)`. `sibling_id` is the first id past
//! that range:
//!
//! ```text
//! id  name     parent  sibling
//! 0   <root>   0       6
//! 1   東京都    0       6
//! 2   渋谷区    1       6
//! 3   A        2       4      -> next child of 渋谷区 is 4
//! 4   B        2       5
//! 5   C        2       6      -> 6 == count, C is the last child
//! ```
//!
//! When the node at `sibling_id` exists and shares the parent it is the
//! next sibling; otherwise the node is its parent's last child.

use eyre::{Result, WrapErr};

use crate::config::{ROOT_ID, UNKNOWN_COORDINATE, UNRESOLVED_SIBLING};
use crate::encoding::codec::{put_f64, put_str, put_u8, put_varint};
use crate::encoding::ByteReader;
use crate::storage::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct AddressNode {
    pub id: u32,
    pub name: String,
    pub name_index: String,
    pub x: f64,
    pub y: f64,
    pub level: u8,
    pub priority: u8,
    pub note: String,
    pub parent_id: u32,
    pub sibling_id: u32,
}

/// Field changes accepted by `PagedTable::<AddressNode>::update_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    SiblingId(u32),
}

impl AddressNode {
    pub fn root() -> Self {
        Self {
            id: ROOT_ID,
            name: String::new(),
            name_index: String::new(),
            x: UNKNOWN_COORDINATE,
            y: UNKNOWN_COORDINATE,
            level: 0,
            priority: 0,
            note: String::new(),
            parent_id: ROOT_ID,
            sibling_id: UNRESOLVED_SIBLING,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn has_point(&self) -> bool {
        self.x != UNKNOWN_COORDINATE && self.y != UNKNOWN_COORDINATE
    }

    pub fn has_children(&self) -> bool {
        self.sibling_id > self.id + 1
    }

    /// Id of the next node sharing this node's parent, given the record
    /// stored at `sibling_id` (`None` when `sibling_id` is past the end).
    pub fn next_sibling(&self, candidate: Option<&AddressNode>) -> Option<u32> {
        match candidate {
            Some(next) if next.id == self.sibling_id && next.parent_id == self.parent_id => {
                Some(next.id)
            }
            _ => None,
        }
    }
}

impl Record for AddressNode {
    const KIND: &'static str = "address_node";
    const SCHEMA_VERSION: u32 = 1;
    const FIELDS: &'static [&'static str] = &[
        "id:varint",
        "name:str",
        "name_index:str",
        "x:f64",
        "y:f64",
        "level:u8",
        "priority:u8",
        "note:str",
        "parent_id:varint",
        "sibling_id:varint",
    ];

    type Field = NodeField;

    fn encode(&self, out: &mut Vec<u8>) {
        put_varint(out, self.id as u64);
        put_str(out, &self.name);
        put_str(out, &self.name_index);
        put_f64(out, self.x);
        put_f64(out, self.y);
        put_u8(out, self.level);
        put_u8(out, self.priority);
        put_str(out, &self.note);
        put_varint(out, self.parent_id as u64);
        put_varint(out, self.sibling_id as u64);
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let node = Self {
            id: r.varint_u32().wrap_err("id")?,
            name: r.str().wrap_err("name")?.to_string(),
            name_index: r.str().wrap_err("name_index")?.to_string(),
            x: r.f64().wrap_err("x")?,
            y: r.f64().wrap_err("y")?,
            level: r.u8().wrap_err("level")?,
            priority: r.u8().wrap_err("priority")?,
            note: r.str().wrap_err("note")?.to_string(),
            parent_id: r.varint_u32().wrap_err("parent_id")?,
            sibling_id: r.varint_u32().wrap_err("sibling_id")?,
        };
        r.finish()?;
        Ok(node)
    }

    fn apply(&mut self, field: &NodeField) {
        match *field {
            NodeField::SiblingId(id) => self.sibling_id = id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, parent_id: u32, sibling_id: u32) -> AddressNode {
        AddressNode {
            id,
            name: format!("n{}", id),
            name_index: format!("n{}", id),
            x: 139.7,
            y: 35.1,
            level: 3,
            priority: 1,
            note: String::new(),
            parent_id,
            sibling_id,
        }
    }

    #[test]
    fn decode_reverses_encode() {
        let mut original = node(7, 3, 12);
        original.note = "aza_id:0001001/postcode:1500002".to_string();
        let mut buf = Vec::new();
        original.encode(&mut buf);

        assert_eq!(AddressNode::decode(&buf).unwrap(), original);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut buf = Vec::new();
        AddressNode::root().encode(&mut buf);
        buf.push(0);
        assert!(AddressNode::decode(&buf).is_err());
    }

    #[test]
    fn apply_sibling_changes_only_sibling() {
        let mut n = node(4, 2, UNRESOLVED_SIBLING);
        n.apply(&NodeField::SiblingId(9));
        assert_eq!(n, node(4, 2, 9));
    }

    #[test]
    fn next_sibling_requires_same_parent() {
        let a = node(3, 2, 4);
        assert_eq!(a.next_sibling(Some(&node(4, 2, 5))), Some(4));
        assert_eq!(a.next_sibling(Some(&node(4, 1, 5))), None);
        assert_eq!(a.next_sibling(None), None);
    }

    #[test]
    fn sentinel_means_no_point() {
        assert!(!AddressNode::root().has_point());
        assert!(node(1, 0, 2).has_point());
    }
}
