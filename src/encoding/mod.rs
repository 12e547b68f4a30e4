//! # Encoding Module
//!
//! Byte-level building blocks for the record layouts stored in page files:
//!
//! - **Varint encoding**: Variable-length integers for ids, lengths and counts
//! - **Field codec**: Writers and a bounds-checked reader for record fields

pub mod codec;
pub mod varint;

pub use codec::ByteReader;
pub use varint::{decode_varint, encode_varint, varint_len};
