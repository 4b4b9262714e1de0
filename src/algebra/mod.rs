//! # Set Algebra
//!
//! The three positional primitives every higher-level operation composes
//! from. Each consumes the abstract column contract only; family byte
//! layouts stay behind the dispatch in [`Column`].
//!
//! | Primitive | Input | Output |
//! |-----------|-------|--------|
//! | [`filter`] | keep-mask + cardinality | kept positions, in order |
//! | [`select`] | index list, any order | gathered values, non-null tag only |
//! | [`append`] | second column, matching flags | ordered concatenation |
//!
//! ## Filter Degenerate Paths
//!
//! Cardinality 0 returns an empty view and cardinality = length returns a
//! clone sharing the backing block; only the in-between case copies bytes
//! (with the two-pass pointer rebuild for variable-length kinds).
//!
//! ## Append Guards
//!
//! Appending demands matching scalar types and characteristics. Under
//! DISTINCT the tail's first element must compare strictly greater than
//! this column's last; under SORTED, greater-or-equal. Mixed
//! non-null/nullable appends promote the non-null side and delegate to the
//! nullable wrapper's null-aware concatenation. The `coerce` variant admits
//! a lossless widening of the tail's kind (narrow cast-or-fail); nothing
//! else is coerced.

use crate::columns::{Column, NullableColumn};
use crate::types::{ScalarType, Value};
use bitvec::prelude::*;
use eyre::{bail, ensure, Result};

/// Emits the kept positions of `column`, in order.
///
/// The caller states the mask cardinality it expects; a mismatch with the
/// mask's actual popcount is an argument error.
pub fn filter(column: &Column, keep: &BitSlice<u64, Lsb0>, cardinality: usize) -> Result<Column> {
    ensure!(
        keep.len() == column.len(),
        "keep-mask of {} bits does not cover a column of {} elements",
        keep.len(),
        column.len()
    );
    ensure!(
        cardinality == keep.count_ones(),
        "stated cardinality {} does not match the mask's {} kept positions",
        cardinality,
        keep.count_ones()
    );
    if cardinality == 0 {
        return column.sub_column(0, 0);
    }
    if cardinality == column.len() {
        return Ok(column.clone());
    }
    Ok(column.filter_kept(keep))
}

/// Gathers `column[indices[0]], column[indices[1]], ...` into a fresh
/// column. No ordering is assumed; the output carries the non-null claim
/// only (nullable inputs stay nullable, absent positions gather as nulls).
pub fn select(column: &Column, indices: &[usize]) -> Result<Column> {
    column.select_impl(indices)
}

/// Ordered concatenation of two columns of the same kind and
/// characteristics.
pub fn append(left: &Column, right: &Column) -> Result<Column> {
    match (left, right) {
        (Column::Nullable(a), Column::Nullable(b)) => Ok(Column::Nullable(a.append(b)?)),
        (Column::Nullable(a), b) => {
            Ok(Column::Nullable(a.append(&NullableColumn::from_column(b)?)?))
        }
        (a, Column::Nullable(b)) => {
            Ok(Column::Nullable(NullableColumn::from_column(a)?.append(b)?))
        }
        (Column::Bool(a), Column::Bool(b)) => Ok(Column::Bool(a.append(b)?)),
        (Column::Int8(a), Column::Int8(b)) => Ok(Column::Int8(a.append(b)?)),
        (Column::Int16(a), Column::Int16(b)) => Ok(Column::Int16(a.append(b)?)),
        (Column::Int32(a), Column::Int32(b)) => Ok(Column::Int32(a.append(b)?)),
        (Column::Int64(a), Column::Int64(b)) => Ok(Column::Int64(a.append(b)?)),
        (Column::Float32(a), Column::Float32(b)) => Ok(Column::Float32(a.append(b)?)),
        (Column::Float64(a), Column::Float64(b)) => Ok(Column::Float64(a.append(b)?)),
        (Column::Date(a), Column::Date(b)) => Ok(Column::Date(a.append(b)?)),
        (Column::Time(a), Column::Time(b)) => Ok(Column::Time(a.append(b)?)),
        (Column::Timestamp(a), Column::Timestamp(b)) => Ok(Column::Timestamp(a.append(b)?)),
        (Column::Decimal(a), Column::Decimal(b)) => Ok(Column::Decimal(a.append(b)?)),
        (Column::Uuid(a), Column::Uuid(b)) => Ok(Column::Uuid(a.append(b)?)),
        (Column::Str(a), Column::Str(b)) => Ok(Column::Str(a.append(b)?)),
        (Column::Bytes(a), Column::Bytes(b)) => Ok(Column::Bytes(a.append(b)?)),
        (a, b) => bail!(
            "cannot append {} column to {} column",
            b.scalar_type(),
            a.scalar_type()
        ),
    }
}

/// [`append`], but first widens the tail losslessly to this column's kind
/// when the kinds differ. Only integer-to-wider-integer and
/// float32-to-float64 widenings are admitted; anything else fails.
pub fn append_coercing(left: &Column, right: &Column) -> Result<Column> {
    if left.scalar_type() == right.scalar_type() {
        return append(left, right);
    }
    let widened = widen(right, left.scalar_type())?;
    append(left, &widened)
}

fn widen(column: &Column, target: ScalarType) -> Result<Column> {
    let mut builder = crate::columns::ColumnBuilder::new(
        target,
        if matches!(column, Column::Nullable(_)) {
            crate::columns::Characteristics::NULLABLE
        } else {
            column.characteristics()
        },
    )?;
    for i in 0..column.len() {
        let value = column.value(i)?;
        builder.push_value(&widen_value(&value, target, column.scalar_type())?)?;
    }
    builder.build()
}

fn widen_value<'a>(value: &Value<'a>, target: ScalarType, source: ScalarType) -> Result<Value<'a>> {
    Ok(match (value, target) {
        (Value::Null, _) => Value::Null,
        (Value::Int8(v), ScalarType::Int16) => Value::Int16(*v as i16),
        (Value::Int8(v), ScalarType::Int32) => Value::Int32(*v as i32),
        (Value::Int8(v), ScalarType::Int64) => Value::Int64(*v as i64),
        (Value::Int16(v), ScalarType::Int32) => Value::Int32(*v as i32),
        (Value::Int16(v), ScalarType::Int64) => Value::Int64(*v as i64),
        (Value::Int32(v), ScalarType::Int64) => Value::Int64(*v as i64),
        (Value::Float32(v), ScalarType::Float64) => Value::Float64(*v as f64),
        _ => bail!("cannot coerce {source} to {target}"),
    })
}
