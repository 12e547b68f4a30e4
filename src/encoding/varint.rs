//! # Variable-Length Integer Encoding
//!
//! Ids, string lengths and list counts inside a record are written as
//! varints. Most ids in an address tree fit in 3-4 bytes, and string
//! lengths almost always fit in one.
//!
//! ## Encoding Format
//!
//! | Value Range              | Bytes | Format                          |
//! |--------------------------|-------|---------------------------------|
//! | 0 - 240                  | 1     | `[value]`                       |
//! | 241 - 2287               | 2     | `[241 + (v-240)>>8, (v-240)&FF]`|
//! | 2288 - 67823             | 3     | `[249, (v-2288)>>8, (v-2288)&FF]`|
//! | 67824 - 16777215         | 4     | `[250, v>>16, v>>8, v]`         |
//! | 16777216 - 4294967295    | 5     | `[251, v>>24, v>>16, v>>8, v]`  |
//! | 4294967296 - u64::MAX    | 9     | `[255, 8-byte big-endian]`      |
//!
//! Markers 252-254 are unused and rejected on decode.

use eyre::{bail, Result};

pub const MAX_VARINT_LEN: usize = 9;

pub fn varint_len(value: u64) -> usize {
    match value {
        0..=240 => 1,
        241..=2287 => 2,
        2288..=67823 => 3,
        67824..=0xFF_FFFF => 4,
        0x100_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Encodes `value` into a fixed buffer, returning it with the number of
/// bytes used.
pub fn encode_varint(value: u64) -> ([u8; MAX_VARINT_LEN], usize) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = varint_len(value);
    match len {
        1 => buf[0] = value as u8,
        2 => {
            let v = value - 240;
            buf[0] = 241 + (v >> 8) as u8;
            buf[1] = v as u8;
        }
        3 => {
            let v = value - 2288;
            buf[0] = 249;
            buf[1..3].copy_from_slice(&(v as u16).to_be_bytes());
        }
        4 => {
            buf[0] = 250;
            buf[1..4].copy_from_slice(&(value as u32).to_be_bytes()[1..]);
        }
        5 => {
            buf[0] = 251;
            buf[1..5].copy_from_slice(&(value as u32).to_be_bytes());
        }
        _ => {
            buf[0] = 255;
            buf[1..9].copy_from_slice(&value.to_be_bytes());
        }
    }
    (buf, len)
}

/// Appends the encoding of `value` to `out`.
pub fn push_varint(out: &mut Vec<u8>, value: u64) {
    let (buf, len) = encode_varint(value);
    out.extend_from_slice(&buf[..len]);
}

/// Decodes one varint from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    match *buf {
        [] => bail!("empty buffer for varint decode"),
        [b @ 0..=240, ..] => Ok((b as u64, 1)),
        [m @ 241..=248, b1, ..] => Ok((240 + ((m as u64 - 241) << 8) + b1 as u64, 2)),
        [249, b1, b2, ..] => Ok((2288 + u16::from_be_bytes([b1, b2]) as u64, 3)),
        [250, b1, b2, b3, ..] => Ok((u32::from_be_bytes([0, b1, b2, b3]) as u64, 4)),
        [251, b1, b2, b3, b4, ..] => Ok((u32::from_be_bytes([b1, b2, b3, b4]) as u64, 5)),
        [255, ref rest @ ..] if rest.len() >= 8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&rest[..8]);
            Ok((u64::from_be_bytes(bytes), 9))
        }
        [m @ (241..=251 | 255), ..] => bail!("truncated varint with marker {}", m),
        [m, ..] => bail!("invalid varint marker: {}", m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARIES: [u64; 12] = [
        0,
        240,
        241,
        2287,
        2288,
        67823,
        67824,
        0xFF_FFFF,
        0x100_0000,
        0xFFFF_FFFF,
        0x1_0000_0000,
        u64::MAX,
    ];

    #[test]
    fn encoded_length_matches_varint_len() {
        for value in BOUNDARIES {
            let (_, len) = encode_varint(value);
            assert_eq!(len, varint_len(value), "value {}", value);
        }
    }

    #[test]
    fn boundary_values_decode_to_themselves() {
        for value in BOUNDARIES {
            let mut out = Vec::new();
            push_varint(&mut out, value);
            let (decoded, read) = decode_varint(&out).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(read, out.len());
        }
    }

    #[test]
    fn decode_rejects_truncated_and_reserved() {
        assert!(decode_varint(&[]).is_err());
        assert!(decode_varint(&[249, 0]).is_err());
        assert!(decode_varint(&[251, 1, 2]).is_err());
        assert!(decode_varint(&[255, 0, 0, 0]).is_err());

        let err = decode_varint(&[253]).unwrap_err();
        assert!(err.to_string().contains("invalid varint marker"));
    }
}
