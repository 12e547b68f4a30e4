//! # Record Trait
//!
//! A paged table stores one record type with a fixed binary layout. The
//! layout is identified by `KIND` and `SCHEMA_VERSION`, both of which are
//! persisted in the table descriptor and checked when the table is opened.
//!
//! Sparse updates are expressed as a list of `Field` values per position.
//! A record type that is never patched after creation uses
//! `std::convert::Infallible` as its `Field`.

use std::fmt;

use eyre::Result;

pub trait Record: Clone + Sized {
    /// Record kind stored in the descriptor, e.g. `"address_node"`.
    const KIND: &'static str;

    /// Version of the field layout written by `encode`.
    const SCHEMA_VERSION: u32;

    /// Field layout in encoding order, `name:type`.
    const FIELDS: &'static [&'static str];

    /// A single field change applied by `PagedTable::update_records`.
    type Field: Clone + fmt::Debug;

    fn encode(&self, out: &mut Vec<u8>);

    fn decode(bytes: &[u8]) -> Result<Self>;

    fn apply(&mut self, field: &Self::Field);
}
