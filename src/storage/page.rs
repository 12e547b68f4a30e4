//! # Page File Format
//!
//! Every page of a paged table is a standalone file holding up to
//! `page_size` records. Records are variable length, so the page carries an
//! offset table that gives O(1) access to slot `pos % page_size`.
//!
//! ## Layout
//!
//! ```text
//! Offset  Size            Description
//! 0       8               Magic: "GEODPAGE"
//! 8       4               Format version (little-endian)
//! 12      4               Record count N
//! 16      8               Body length in bytes
//! 24      8               CRC-64/ECMA-182 over offset table + body
//! 32      4 * N           Offset of each record within the body
//! 32+4N   body_len        Concatenated record encodings
//! ```
//!
//! Record `i` spans `offsets[i]..offsets[i + 1]` (the last one ends at
//! `body_len`).
//!
//! ## Integrity
//!
//! The checksum is verified once when a page is mapped or loaded for
//! rewriting. Any mismatch, bad magic or inconsistent length is reported to
//! the caller, which classifies it as store corruption. A decoded record is
//! never fabricated from a damaged page.

use crc::{Crc, CRC_64_ECMA_182};
use eyre::{ensure, Result, WrapErr};
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::Record;
use crate::config::{FORMAT_VERSION, PAGE_HEADER_SIZE, PAGE_MAGIC, PAGE_OFFSET_SIZE};

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PageHeader {
    magic: [u8; 8],
    version: U32,
    record_count: U32,
    body_len: U64,
    checksum: U64,
}

const _: () = assert!(std::mem::size_of::<PageHeader>() == PAGE_HEADER_SIZE);

impl PageHeader {
    pub fn new(record_count: u32, body_len: u64, checksum: u64) -> Self {
        Self {
            magic: *PAGE_MAGIC,
            version: U32::new(FORMAT_VERSION),
            record_count: U32::new(record_count),
            body_len: U64::new(body_len),
            checksum: U64::new(checksum),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            bytes.len(),
            PAGE_HEADER_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse PageHeader: {:?}", e))?;

        ensure!(&header.magic == PAGE_MAGIC, "invalid magic bytes in page file");

        ensure!(
            header.version.get() == FORMAT_VERSION,
            "unsupported page format version: {} (expected {})",
            header.version.get(),
            FORMAT_VERSION
        );

        Ok(header)
    }

    pub fn record_count(&self) -> u32 {
        self.record_count.get()
    }

    pub fn body_len(&self) -> u64 {
        self.body_len.get()
    }

    pub fn checksum(&self) -> u64 {
        self.checksum.get()
    }
}

/// Serializes `records` into a complete page file image.
pub fn encode_page<R: Record>(records: &[R]) -> Result<Vec<u8>> {
    let record_count =
        u32::try_from(records.len()).wrap_err("too many records for a single page")?;

    let mut offsets = Vec::with_capacity(records.len() * PAGE_OFFSET_SIZE);
    let mut body = Vec::new();

    for record in records {
        let offset = u32::try_from(body.len()).wrap_err("page body exceeds 4 GiB")?;
        offsets.extend_from_slice(&offset.to_le_bytes());
        record.encode(&mut body);
    }

    let mut digest = CRC64.digest();
    digest.update(&offsets);
    digest.update(&body);
    let header = PageHeader::new(record_count, body.len() as u64, digest.finalize());

    let mut out = Vec::with_capacity(PAGE_HEADER_SIZE + offsets.len() + body.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&offsets);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Borrowed view over a page image (mapped or read into memory).
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    header: &'a PageHeader,
    offsets: &'a [u8],
    body: &'a [u8],
}

impl<'a> PageView<'a> {
    /// Parses the framing of a page without verifying the checksum.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header = PageHeader::from_bytes(bytes)?;

        let offsets_len = header.record_count() as usize * PAGE_OFFSET_SIZE;
        let expected = PAGE_HEADER_SIZE as u64 + offsets_len as u64 + header.body_len();
        ensure!(
            bytes.len() as u64 == expected,
            "page size mismatch: {} bytes on disk, header describes {}",
            bytes.len(),
            expected
        );

        let offsets_end = PAGE_HEADER_SIZE + offsets_len;
        Ok(Self {
            header,
            offsets: &bytes[PAGE_HEADER_SIZE..offsets_end],
            body: &bytes[offsets_end..],
        })
    }

    /// Parses the page and verifies its checksum.
    pub fn parse_verified(bytes: &'a [u8]) -> Result<Self> {
        let view = Self::parse(bytes)?;
        view.verify()?;
        Ok(view)
    }

    pub fn verify(&self) -> Result<()> {
        let mut digest = CRC64.digest();
        digest.update(self.offsets);
        digest.update(self.body);
        let actual = digest.finalize();

        ensure!(
            actual == self.header.checksum(),
            "page checksum mismatch: stored {:#018x}, computed {:#018x}",
            self.header.checksum(),
            actual
        );
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count() as usize
    }

    fn offset(&self, slot: usize) -> usize {
        let start = slot * PAGE_OFFSET_SIZE;
        let mut raw = [0u8; PAGE_OFFSET_SIZE];
        raw.copy_from_slice(&self.offsets[start..start + PAGE_OFFSET_SIZE]);
        u32::from_le_bytes(raw) as usize
    }

    pub fn record_bytes(&self, slot: usize) -> Result<&'a [u8]> {
        ensure!(
            slot < self.record_count(),
            "slot {} out of bounds (record_count={})",
            slot,
            self.record_count()
        );

        let start = self.offset(slot);
        let end = if slot + 1 < self.record_count() {
            self.offset(slot + 1)
        } else {
            self.body.len()
        };

        ensure!(
            start <= end && end <= self.body.len(),
            "record {} spans {}..{} outside body of {} bytes",
            slot,
            start,
            end,
            self.body.len()
        );

        Ok(&self.body[start..end])
    }

    pub fn decode_all<R: Record>(&self) -> Result<Vec<R>> {
        (0..self.record_count())
            .map(|slot| {
                let bytes = self.record_bytes(slot)?;
                R::decode(bytes).wrap_err_with(|| format!("failed to decode slot {}", slot))
            })
            .collect()
    }
}
