//! # Column Builders
//!
//! [`ColumnBuilder`] is the one mutable object in the engine: a growable
//! accumulator that freezes into an immutable column. It tracks the packed
//! present values and a separate presence bitmap; `build()` produces a plain
//! non-null column when the builder was declared non-null and a nullable
//! column otherwise, even when a nullable builder saw no nulls.
//!
//! ## Freeze Semantics
//!
//! `build()` trim-and-copies the accumulated bytes: frozen output never
//! aliases the live accumulator, so the builder may keep accumulating and
//! freeze again later.
//!
//! ```ignore
//! let mut builder = ColumnBuilder::new(ScalarType::Int32, Characteristics::SORTED)?;
//! builder.push_i32(1)?;
//! builder.push_i32(3)?;
//! let first = builder.build()?;   // [1, 3]
//! builder.push_i32(7)?;
//! let second = builder.build()?;  // [1, 3, 7]; `first` is unchanged
//! ```
//!
//! Declared sorted/distinct claims are verified at `build()`, not per push.
//! Builders are not thread-safe; confine one to a single thread while it
//! accumulates.

use crate::bitmap::{Mask, PresenceMap};
use crate::columns::{
    BoolColumn, Characteristics, Column, DecimalColumn, FixedColumn, NullableColumn, VarLenColumn,
};
use crate::memory::{ByteBlock, GrowableBlock};
use crate::types::{ScalarType, Value};
use eyre::{bail, ensure, Result};
use std::borrow::Cow;
use std::io::Read;

enum Accum {
    Bool(Mask),
    Fixed(GrowableBlock),
    VarLen {
        data: GrowableBlock,
        pointers: Vec<u32>,
    },
}

pub struct ColumnBuilder {
    ty: ScalarType,
    chars: Characteristics,
    scale: u8,
    presence: Mask,
    rows: usize,
    accum: Accum,
}

impl std::fmt::Debug for ColumnBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnBuilder")
            .field("ty", &self.ty)
            .field("scale", &self.scale)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

macro_rules! typed_pushes {
    ($($fn_name:ident($native:ty) => $val_variant:ident),* $(,)?) => {
        $(
            pub fn $fn_name(&mut self, value: $native) -> Result<()> {
                self.push_value(&Value::$val_variant(value))
            }
        )*
    };
}

impl ColumnBuilder {
    /// A builder for `ty` targeting `chars`. Order claims on booleans are
    /// not supported; nulls may only be pushed when `chars` is NULLABLE.
    pub fn new(ty: ScalarType, chars: Characteristics) -> Result<Self> {
        if !ty.supports_order() && chars.is_sorted() {
            return Err(BoolColumn::order_unsupported("a sorted builder"));
        }
        let accum = match ty {
            ScalarType::Bool => Accum::Bool(Mask::new()),
            ScalarType::Text | ScalarType::Blob => Accum::VarLen {
                data: GrowableBlock::new(),
                pointers: Vec::new(),
            },
            _ => Accum::Fixed(GrowableBlock::new()),
        };
        Ok(Self {
            ty,
            chars,
            scale: 0,
            presence: Mask::new(),
            rows: 0,
            accum,
        })
    }

    /// A decimal builder with a column-level scale.
    pub fn decimal(scale: u8, chars: Characteristics) -> Result<Self> {
        let mut builder = Self::new(ScalarType::Decimal, chars)?;
        builder.scale = scale;
        Ok(builder)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    pub fn scalar_type(&self) -> ScalarType {
        self.ty
    }

    pub fn push_null(&mut self) -> Result<()> {
        self.push_value(&Value::Null)
    }

    /// Appends one value. The kind must match the builder's scalar type
    /// exactly; decimals must carry the builder's scale.
    pub fn push_value(&mut self, value: &Value<'_>) -> Result<()> {
        let Some(kind) = value.scalar_type() else {
            ensure!(
                !self.chars.is_nonnull(),
                "null value not allowed in a {:?} builder",
                self.chars
            );
            self.presence.push(false);
            self.rows += 1;
            return Ok(());
        };
        ensure!(
            kind == self.ty,
            "cannot push {} value into {} builder",
            kind,
            self.ty
        );
        match (value, &mut self.accum) {
            (Value::Bool(v), Accum::Bool(bits)) => bits.push(*v),
            (Value::Int8(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Int16(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Int32(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Int64(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Float32(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Float64(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Date(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Time(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Timestamp(v), Accum::Fixed(block)) => block.push_bytes(&v.to_le_bytes()),
            (Value::Decimal { digits, scale }, Accum::Fixed(block)) => {
                ensure!(
                    *scale == self.scale,
                    "mismatched decimal scales: builder holds {}, value carries {}",
                    self.scale,
                    scale
                );
                block.push_bytes(&digits.to_le_bytes());
            }
            (Value::Uuid(v), Accum::Fixed(block)) => block.push_bytes(v),
            (Value::Text(v), Accum::VarLen { data, pointers }) => {
                pointers.push(data.len() as u32);
                data.push_bytes(v.as_bytes());
            }
            (Value::Blob(v), Accum::VarLen { data, pointers }) => {
                pointers.push(data.len() as u32);
                data.push_bytes(v);
            }
            _ => unreachable!("kind checked above"),
        }
        self.presence.push(true);
        self.rows += 1;
        Ok(())
    }

    typed_pushes! {
        push_bool(bool) => Bool,
        push_i8(i8) => Int8,
        push_i16(i16) => Int16,
        push_i32(i32) => Int32,
        push_i64(i64) => Int64,
        push_f32(f32) => Float32,
        push_f64(f64) => Float64,
        push_date(i32) => Date,
        push_time(i64) => Time,
        push_timestamp(i64) => Timestamp,
        push_uuid([u8; 16]) => Uuid,
    }

    pub fn push_decimal(&mut self, digits: i128) -> Result<()> {
        let scale = self.scale;
        self.push_value(&Value::Decimal { digits, scale })
    }

    pub fn push_str(&mut self, value: &str) -> Result<()> {
        self.push_value(&Value::Text(Cow::Borrowed(value)))
    }

    pub fn push_blob(&mut self, value: &[u8]) -> Result<()> {
        self.push_value(&Value::Blob(Cow::Borrowed(value)))
    }

    /// Freezes the accumulated rows into an immutable column: non-null when
    /// the builder was declared non-null, nullable otherwise. Declared order
    /// claims are verified here.
    pub fn build(&self) -> Result<Column> {
        let values = self.build_values()?;
        if self.chars.is_nonnull() {
            return Ok(values);
        }
        Ok(Column::Nullable(NullableColumn::new(
            values,
            PresenceMap::from_bits(self.presence.clone()),
        )?))
    }

    /// The packed present values as a non-null column.
    fn build_values(&self) -> Result<Column> {
        let chars = if self.chars.is_nonnull() {
            self.chars
        } else {
            Characteristics::NONNULL
        };
        let count = self.presence.count_ones();
        Ok(match &self.accum {
            Accum::Bool(bits) => Column::Bool(BoolColumn::from_bitslice(bits)),
            Accum::Fixed(block) => {
                let frozen = block.freeze();
                match self.ty {
                    ScalarType::Int8 => Column::Int8(FixedColumn::from_parts(frozen, count, chars)?),
                    ScalarType::Int16 => {
                        Column::Int16(FixedColumn::from_parts(frozen, count, chars)?)
                    }
                    ScalarType::Int32 => {
                        Column::Int32(FixedColumn::from_parts(frozen, count, chars)?)
                    }
                    ScalarType::Int64 => {
                        Column::Int64(FixedColumn::from_parts(frozen, count, chars)?)
                    }
                    ScalarType::Float32 => {
                        Column::Float32(FixedColumn::from_parts(frozen, count, chars)?)
                    }
                    ScalarType::Float64 => {
                        Column::Float64(FixedColumn::from_parts(frozen, count, chars)?)
                    }
                    ScalarType::Date => Column::Date(FixedColumn::from_parts(frozen, count, chars)?),
                    ScalarType::Time => Column::Time(FixedColumn::from_parts(frozen, count, chars)?),
                    ScalarType::Timestamp => {
                        Column::Timestamp(FixedColumn::from_parts(frozen, count, chars)?)
                    }
                    ScalarType::Decimal => Column::Decimal(DecimalColumn::from_parts(
                        frozen, count, self.scale, chars,
                    )?),
                    ScalarType::Uuid => Column::Uuid(FixedColumn::from_parts(frozen, count, chars)?),
                    other => bail!("scalar type {other} does not use a fixed accumulator"),
                }
            }
            Accum::VarLen { data, pointers } => {
                let mut ptr_bytes = Vec::with_capacity(pointers.len() * 4);
                for p in pointers {
                    ptr_bytes.extend_from_slice(&p.to_le_bytes());
                }
                let column = VarLenColumn::from_parts(
                    data.freeze(),
                    ByteBlock::from_vec(ptr_bytes),
                    count,
                    self.ty,
                    chars,
                )?;
                match self.ty {
                    ScalarType::Text => Column::Str(column),
                    _ => Column::Bytes(column),
                }
            }
        })
    }

    /// Thaws a serialized column body into this builder, the freeze/thaw
    /// counterpart of [`crate::encoding::write_column`]. Only a freshly
    /// constructed builder may thaw; a builder that already holds rows is a
    /// state error.
    pub fn thaw(&mut self, reader: &mut impl Read) -> Result<()> {
        ensure!(
            self.rows == 0,
            "builder already holds rows; thaw requires a freshly constructed builder"
        );
        let column = crate::encoding::read_column(reader, self.ty, self.chars)?;
        for i in 0..column.len() {
            self.push_value(&column.value(i)?)?;
        }
        Ok(())
    }
}
