//! # Record Field Codec
//!
//! Primitive writers and a bounds-checked cursor shared by every record
//! layout. Records are a plain concatenation of fields; there are no tags,
//! the field order is fixed by the record's schema version.
//!
//! | Field kind | Encoding                         |
//! |------------|----------------------------------|
//! | id / count | varint                           |
//! | u8         | 1 byte                           |
//! | f64        | 8 bytes little-endian            |
//! | string     | varint byte length + UTF-8 bytes |

use eyre::{ensure, Result, WrapErr};

use super::varint::{decode_varint, push_varint};

pub fn put_varint(out: &mut Vec<u8>, value: u64) {
    push_varint(out, value);
}

pub fn put_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn put_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_str(out: &mut Vec<u8>, value: &str) {
    push_varint(out, value.len() as u64);
    out.extend_from_slice(value.as_bytes());
}

pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure!(
            self.remaining() >= len,
            "record truncated: need {} bytes at offset {}, {} left",
            len,
            self.pos,
            self.remaining()
        );
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn varint(&mut self) -> Result<u64> {
        let (value, read) = decode_varint(&self.buf[self.pos..])?;
        self.pos += read;
        Ok(value)
    }

    pub fn varint_u32(&mut self) -> Result<u32> {
        let value = self.varint()?;
        u32::try_from(value).wrap_err_with(|| format!("value {} does not fit in u32", value))
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn f64(&mut self) -> Result<f64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    pub fn str(&mut self) -> Result<&'a str> {
        let len = self.varint()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).wrap_err("string field is not valid UTF-8")
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fails if any bytes were left unread.
    pub fn finish(self) -> Result<()> {
        ensure!(
            self.remaining() == 0,
            "{} trailing bytes after record",
            self.remaining()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_written_order() {
        let mut out = Vec::new();
        put_varint(&mut out, 500_001);
        put_str(&mut out, "渋谷区");
        put_f64(&mut out, 139.7);
        put_u8(&mut out, 4);

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.varint_u32().unwrap(), 500_001);
        assert_eq!(reader.str().unwrap(), "渋谷区");
        assert_eq!(reader.f64().unwrap(), 139.7);
        assert_eq!(reader.u8().unwrap(), 4);
        reader.finish().unwrap();
    }

    #[test]
    fn truncated_string_is_an_error() {
        let mut out = Vec::new();
        put_str(&mut out, "abcdef");
        out.truncate(4);

        let mut reader = ByteReader::new(&out);
        assert!(reader.str().is_err());
    }

    #[test]
    fn finish_rejects_trailing_bytes() {
        let out = vec![1u8, 2];
        let mut reader = ByteReader::new(&out);
        reader.u8().unwrap();
        assert!(reader.finish().is_err());
    }

    #[test]
    fn oversized_id_is_rejected() {
        let mut out = Vec::new();
        put_varint(&mut out, u64::from(u32::MAX) + 1);
        assert!(ByteReader::new(&out).varint_u32().is_err());
    }
}
