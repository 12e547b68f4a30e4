//! Dataset provenance. `id` is the priority the source's lines carry, so a
//! node's `priority` points back at the dataset it came from.

use std::convert::Infallible;

use eyre::{Result, WrapErr};

use crate::encoding::codec::{put_str, put_varint};
use crate::encoding::ByteReader;
use crate::storage::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub id: u32,
    pub title: String,
    pub url: String,
}

impl DatasetRecord {
    pub fn new(id: u32, title: &str, url: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            url: url.to_string(),
        }
    }
}

impl Record for DatasetRecord {
    const KIND: &'static str = "dataset";
    const SCHEMA_VERSION: u32 = 1;
    const FIELDS: &'static [&'static str] = &["id:varint", "title:str", "url:str"];

    type Field = Infallible;

    fn encode(&self, out: &mut Vec<u8>) {
        put_varint(out, self.id as u64);
        put_str(out, &self.title);
        put_str(out, &self.url);
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let record = Self {
            id: r.varint_u32().wrap_err("id")?,
            title: r.str().wrap_err("title")?.to_string(),
            url: r.str().wrap_err("url")?.to_string(),
        };
        r.finish()?;
        Ok(record)
    }

    fn apply(&mut self, field: &Infallible) {
        match *field {}
    }
}
