//! # File Header
//!
//! The fixed-size header prefix is a zerocopy struct read and written as
//! raw bytes; the per-column records that follow are length-prefixed UTF-8
//! strings plus the characteristics bitmask.
//!
//! All multi-byte fields are little-endian via the zerocopy wrapper types,
//! so the prefix can be parsed in place without copying.

use crate::columns::Characteristics;
use crate::types::ScalarType;
use eyre::{ensure, Result};
use smallvec::SmallVec;
use std::io::{Read, Write};
use zerocopy::little_endian::{I32, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const FILE_MAGIC: &[u8; 8] = b"COLNNADE";
pub const FORMAT_VERSION: u32 = 1;

const HEADER_PREFIX_SIZE: usize = 20;
/// Sanity cap on header string lengths; real names and codes are tiny.
const MAX_HEADER_STRING: u32 = 1 << 16;

/// Per-column metadata carried by the file header.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub ty: ScalarType,
    pub characteristics: Characteristics,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct FileHeaderPrefix {
    magic: [u8; 8],
    version: U32,
    column_count: U32,
    key_column: I32,
}

const _: () = assert!(std::mem::size_of::<FileHeaderPrefix>() == HEADER_PREFIX_SIZE);

impl FileHeaderPrefix {
    pub fn new(column_count: u32, key_column: Option<usize>) -> Self {
        Self {
            magic: *FILE_MAGIC,
            version: U32::new(FORMAT_VERSION),
            column_count: U32::new(column_count),
            key_column: I32::new(key_column.map_or(-1, |k| k as i32)),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= HEADER_PREFIX_SIZE,
            "buffer too small for file header: {} < {}",
            bytes.len(),
            HEADER_PREFIX_SIZE
        );
        let header = Self::ref_from_bytes(&bytes[..HEADER_PREFIX_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse file header: {e:?}"))?;
        ensure!(&header.magic == FILE_MAGIC, "invalid magic bytes in file header");
        ensure!(
            header.version.get() == FORMAT_VERSION,
            "unsupported format version: {} (expected {})",
            header.version.get(),
            FORMAT_VERSION
        );
        Ok(header)
    }

    crate::zerocopy_getters! {
        version: u32,
        column_count: u32,
    }

    pub fn key_column(&self) -> Option<usize> {
        let key = self.key_column.get();
        (key >= 0).then_some(key as usize)
    }
}

/// Writes the file header: fixed prefix, then one record per column.
pub fn write_file_header(
    writer: &mut impl Write,
    metas: &[ColumnMeta],
    key_column: Option<usize>,
) -> Result<()> {
    if let Some(key) = key_column {
        ensure!(
            key < metas.len(),
            "key column {} out of range for {} columns",
            key,
            metas.len()
        );
    }
    let prefix = FileHeaderPrefix::new(metas.len() as u32, key_column);
    writer.write_all(prefix.as_bytes())?;
    for meta in metas {
        write_string(writer, &meta.name)?;
        write_string(writer, meta.ty.code())?;
        writer.write_all(&u32::from(meta.characteristics.bits()).to_le_bytes())?;
    }
    Ok(())
}

/// Reads the file header written by [`write_file_header`].
pub fn read_file_header(
    reader: &mut impl Read,
) -> Result<(SmallVec<[ColumnMeta; 8]>, Option<usize>)> {
    let mut prefix_bytes = [0u8; HEADER_PREFIX_SIZE];
    reader.read_exact(&mut prefix_bytes)?;
    let prefix = FileHeaderPrefix::from_bytes(&prefix_bytes)?;
    let key_column = prefix.key_column();
    let count = prefix.column_count() as usize;
    if let Some(key) = key_column {
        ensure!(
            key < count,
            "key column {key} out of range for {count} columns"
        );
    }
    let mut metas = SmallVec::with_capacity(count);
    for _ in 0..count {
        let name = read_string(reader)?;
        let code = read_string(reader)?;
        let bits = super::read_u32(reader)?;
        ensure!(
            bits <= u8::MAX as u32,
            "characteristics bitmask {bits:#x} out of range"
        );
        metas.push(ColumnMeta {
            name,
            ty: ScalarType::from_code(&code)?,
            characteristics: Characteristics::from_bits(bits as u8)?,
        });
    }
    Ok((metas, key_column))
}

fn write_string(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(&(s.len() as u32).to_le_bytes())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = super::read_u32(reader)?;
    ensure!(len <= MAX_HEADER_STRING, "header string of {len} bytes is malformed");
    let bytes = super::read_exact_vec(reader, len as usize)?;
    String::from_utf8(bytes).map_err(|e| eyre::eyre!("header string is not UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_round_trips_through_bytes() {
        let prefix = FileHeaderPrefix::new(3, Some(1));
        let parsed = FileHeaderPrefix::from_bytes(prefix.as_bytes()).unwrap();
        assert_eq!(parsed.version(), FORMAT_VERSION);
        assert_eq!(parsed.column_count(), 3);
        assert_eq!(parsed.key_column(), Some(1));
    }

    #[test]
    fn prefix_encodes_missing_key_column_as_negative() {
        let prefix = FileHeaderPrefix::new(2, None);
        let parsed = FileHeaderPrefix::from_bytes(prefix.as_bytes()).unwrap();
        assert_eq!(parsed.key_column(), None);
    }

    #[test]
    fn prefix_rejects_bad_magic() {
        let mut bytes = FileHeaderPrefix::new(1, None).as_bytes().to_vec();
        bytes[0] ^= 0xFF;
        let err = FileHeaderPrefix::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn header_round_trips_metas_and_key() {
        let metas = vec![
            ColumnMeta {
                name: "id".to_string(),
                ty: ScalarType::Int64,
                characteristics: Characteristics::DISTINCT,
            },
            ColumnMeta {
                name: "name".to_string(),
                ty: ScalarType::Text,
                characteristics: Characteristics::NULLABLE,
            },
        ];
        let mut buf = Vec::new();
        write_file_header(&mut buf, &metas, Some(0)).unwrap();
        let (parsed, key) = read_file_header(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed.as_slice(), metas.as_slice());
        assert_eq!(key, Some(0));
    }
}
