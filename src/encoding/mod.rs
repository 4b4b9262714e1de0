//! # Binary Serialization
//!
//! Freeze/thaw wire format for columns: a per-column body that round-trips
//! raw backing bytes, and a file header binding named columns to their
//! type codes and characteristics.
//!
//! ## Per-Column Body
//!
//! Every body starts with a byte-order marker and a `u32` element count,
//! then the family payload:
//!
//! ```text
//! fixed-width:  [order:1][count:4][raw bytes: count * element_size]
//! boolean:      [order:1][count:4][packed bits: (count + 7) / 8]
//! decimal:      [order:1][count:4][scale:1][digits: count * 16]
//! variable:     [order:1][count:4][pointers: count * 4][total_len:4][bytes]
//! nullable:     [order:1][count:4][presence: (count + 7) / 8][inner body]
//! ```
//!
//! Little-endian is always written; a big-endian marker is recognized and
//! rejected as unsupported. Reading is the exact inverse of writing, and
//! every read re-validates block shapes and order claims.
//!
//! ## File Layout
//!
//! ```text
//! [magic:8]["version":4][column_count:4][key_column:4]
//! per column: [name_len:4][name][code_len:4][code][characteristics:4]
//! then the column bodies, in order
//! ```
//!
//! The header is produced here and consumed by the external tabular
//! container; the container never touches a column's backing block.

mod headers;

pub use headers::{
    read_file_header, write_file_header, ColumnMeta, FileHeaderPrefix, FILE_MAGIC, FORMAT_VERSION,
};

use crate::bitmap::PresenceMap;
use crate::columns::{
    BoolColumn, Characteristics, Column, DecimalColumn, FixedColumn, NullableColumn, VarLenColumn,
};
use crate::memory::ByteBlock;
use crate::types::ScalarType;
use eyre::{bail, ensure, Result};
use std::io::{Read, Write};

/// Byte-order marker for little-endian bodies, the only order written.
pub const ORDER_LITTLE_ENDIAN: u8 = 1;
/// Byte-order marker for big-endian bodies; recognized, never produced.
pub const ORDER_BIG_ENDIAN: u8 = 2;

/// Writes one column body.
pub fn write_column(writer: &mut impl Write, column: &Column) -> Result<()> {
    writer.write_all(&[ORDER_LITTLE_ENDIAN])?;
    writer.write_all(&(column.len() as u32).to_le_bytes())?;
    match column {
        Column::Bool(c) => writer.write_all(&c.packed_bytes())?,
        Column::Decimal(c) => {
            writer.write_all(&[c.scale()])?;
            writer.write_all(c.as_bytes())?;
        }
        Column::Str(c) | Column::Bytes(c) => write_varlen_body(writer, c)?,
        Column::Nullable(n) => {
            writer.write_all(&n.presence().to_bytes())?;
            write_column(writer, n.dense())?;
        }
        Column::Int8(c) => writer.write_all(c.as_bytes())?,
        Column::Int16(c) => writer.write_all(c.as_bytes())?,
        Column::Int32(c) => writer.write_all(c.as_bytes())?,
        Column::Int64(c) => writer.write_all(c.as_bytes())?,
        Column::Float32(c) => writer.write_all(c.as_bytes())?,
        Column::Float64(c) => writer.write_all(c.as_bytes())?,
        Column::Date(c) => writer.write_all(c.as_bytes())?,
        Column::Time(c) => writer.write_all(c.as_bytes())?,
        Column::Timestamp(c) => writer.write_all(c.as_bytes())?,
        Column::Uuid(c) => writer.write_all(c.as_bytes())?,
    }
    Ok(())
}

fn write_varlen_body(writer: &mut impl Write, column: &VarLenColumn) -> Result<()> {
    for i in 0..column.len() {
        writer.write_all(&column.pointer_at(i).to_le_bytes())?;
    }
    let data = column.data_window();
    writer.write_all(&(data.len() as u32).to_le_bytes())?;
    writer.write_all(data)?;
    Ok(())
}

/// Reads one column body written by [`write_column`]. The scalar type and
/// characteristics come from the file header (or the thawing builder);
/// block shapes and order claims are re-verified on the way in.
pub fn read_column(
    reader: &mut impl Read,
    ty: ScalarType,
    chars: Characteristics,
) -> Result<Column> {
    let order = read_u8(reader)?;
    if order == ORDER_BIG_ENDIAN {
        bail!("big-endian column sections are not supported");
    }
    ensure!(
        order == ORDER_LITTLE_ENDIAN,
        "unknown byte-order marker: {order}"
    );
    if !ty.supports_order() && chars.is_sorted() {
        bail!("characteristics {chars:?} are not supported for boolean columns");
    }
    let count = read_u32(reader)? as usize;

    if !chars.is_nonnull() {
        let bitmap = read_exact_vec(reader, count.div_ceil(8))?;
        let presence = PresenceMap::from_bytes(&bitmap, count)?;
        let inner = read_column(reader, ty, Characteristics::NONNULL)?;
        ensure!(
            inner.len() == presence.present_count(),
            "nullable body holds {} values for {} present positions",
            inner.len(),
            presence.present_count()
        );
        return Ok(Column::Nullable(NullableColumn::new(inner, presence)?));
    }

    Ok(match ty {
        ScalarType::Bool => {
            let packed = read_exact_vec(reader, count.div_ceil(8))?;
            Column::Bool(BoolColumn::from_packed_bytes(packed, count)?)
        }
        ScalarType::Decimal => {
            let scale = read_u8(reader)?;
            let raw = read_exact_vec(reader, count * 16)?;
            Column::Decimal(DecimalColumn::from_parts(
                ByteBlock::from_vec(raw),
                count,
                scale,
                chars,
            )?)
        }
        ScalarType::Text | ScalarType::Blob => {
            let pointers = read_exact_vec(reader, count * 4)?;
            let total = read_u32(reader)? as usize;
            let data = read_exact_vec(reader, total)?;
            let column = VarLenColumn::from_parts(
                ByteBlock::from_vec(data),
                ByteBlock::from_vec(pointers),
                count,
                ty,
                chars,
            )?;
            if ty == ScalarType::Text {
                Column::Str(column)
            } else {
                Column::Bytes(column)
            }
        }
        _ => {
            let width = match ty.fixed_size() {
                Some(w) => w,
                None => bail!("scalar type {ty} has no fixed-width body"),
            };
            let raw = read_exact_vec(reader, count * width)?;
            fixed_from_block(ty, ByteBlock::from_vec(raw), count, chars)?
        }
    })
}

fn fixed_from_block(
    ty: ScalarType,
    block: ByteBlock,
    count: usize,
    chars: Characteristics,
) -> Result<Column> {
    Ok(match ty {
        ScalarType::Int8 => Column::Int8(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Int16 => Column::Int16(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Int32 => Column::Int32(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Int64 => Column::Int64(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Float32 => Column::Float32(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Float64 => Column::Float64(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Date => Column::Date(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Time => Column::Time(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Timestamp => Column::Timestamp(FixedColumn::from_parts(block, count, chars)?),
        ScalarType::Uuid => Column::Uuid(FixedColumn::from_parts(block, count, chars)?),
        other => bail!("scalar type {other} has no fixed-width body"),
    })
}

/// Writes a complete column set: file header, then bodies in order.
pub fn write_columns(
    writer: &mut impl Write,
    columns: &[(&str, &Column)],
    key_column: Option<usize>,
) -> Result<()> {
    let metas: Vec<ColumnMeta> = columns
        .iter()
        .map(|(name, column)| ColumnMeta {
            name: (*name).to_string(),
            ty: column.scalar_type(),
            characteristics: column.characteristics(),
        })
        .collect();
    if let Some(key) = key_column {
        ensure!(
            key < columns.len(),
            "key column {} out of range for {} columns",
            key,
            columns.len()
        );
        ensure!(
            columns[key].1.is_distinct(),
            "key column {} must be distinct",
            key
        );
    }
    write_file_header(writer, &metas, key_column)?;
    for (_, column) in columns {
        write_column(writer, column)?;
    }
    Ok(())
}

/// Reads a complete column set written by [`write_columns`].
pub fn read_columns(reader: &mut impl Read) -> Result<(Vec<(String, Column)>, Option<usize>)> {
    let (metas, key_column) = read_file_header(reader)?;
    let mut columns = Vec::with_capacity(metas.len());
    for meta in metas {
        let column = read_column(reader, meta.ty, meta.characteristics)?;
        columns.push((meta.name, column));
    }
    Ok((columns, key_column))
}

pub(crate) fn read_u8(reader: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_exact_vec(reader: &mut impl Read, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
