//! # Column Families
//!
//! The typed column containers and the [`Column`] tagged union that fronts
//! them. Families share the backing-block view model and the search/sort
//! machinery; the union provides uniform dispatch so the set-algebra and
//! join layers never touch family internals.
//!
//! ## Families
//!
//! | Family | Kinds | Layout |
//! |--------|-------|--------|
//! | [`BoolColumn`] | bool | bit-packed block |
//! | [`FixedColumn`] | i8/i16/i32/i64, f32/f64, date, time, timestamp, uuid | fixed-stride block |
//! | [`DecimalColumn`] | decimal | i128 digit block + column scale |
//! | [`VarLenColumn`] | text, blob | element bytes + pointer array |
//! | [`NullableColumn`] | any of the above with gaps | packed values + presence map |
//!
//! The kind set is small and fixed, so dispatch is a tagged union with
//! macro-generated arms rather than a trait-object hierarchy.

pub mod boolean;
pub mod builder;
pub mod characteristics;
pub mod decimal;
pub mod fixed;
pub mod nullable;
pub mod search;
pub mod varlen;


pub use boolean::BoolColumn;
pub use builder::ColumnBuilder;
pub use characteristics::Characteristics;
pub use decimal::DecimalColumn;
pub use fixed::{FixedColumn, FixedElem};
pub use nullable::NullableColumn;
pub use search::SearchOutcome;
pub use varlen::VarLenColumn;

use crate::types::{ScalarType, Value};
use bitvec::prelude::*;
use eyre::{bail, ensure, Result};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Dispatches over every family, binding the inner column.
macro_rules! with_families {
    ($col:expr, $c:ident => $body:expr) => {
        match $col {
            Column::Bool($c) => $body,
            Column::Int8($c) => $body,
            Column::Int16($c) => $body,
            Column::Int32($c) => $body,
            Column::Int64($c) => $body,
            Column::Float32($c) => $body,
            Column::Float64($c) => $body,
            Column::Date($c) => $body,
            Column::Time($c) => $body,
            Column::Timestamp($c) => $body,
            Column::Decimal($c) => $body,
            Column::Uuid($c) => $body,
            Column::Str($c) => $body,
            Column::Bytes($c) => $body,
            Column::Nullable($c) => $body,
        }
    };
}

/// Dispatches over every family, rewrapping the result into the same
/// variant.
macro_rules! map_families {
    ($col:expr, $c:ident => $body:expr) => {
        match $col {
            Column::Bool($c) => Column::Bool($body),
            Column::Int8($c) => Column::Int8($body),
            Column::Int16($c) => Column::Int16($body),
            Column::Int32($c) => Column::Int32($body),
            Column::Int64($c) => Column::Int64($body),
            Column::Float32($c) => Column::Float32($body),
            Column::Float64($c) => Column::Float64($body),
            Column::Date($c) => Column::Date($body),
            Column::Time($c) => Column::Time($body),
            Column::Timestamp($c) => Column::Timestamp($body),
            Column::Decimal($c) => Column::Decimal($body),
            Column::Uuid($c) => Column::Uuid($body),
            Column::Str($c) => Column::Str($body),
            Column::Bytes($c) => Column::Bytes($body),
            Column::Nullable($c) => Column::Nullable($body),
        }
    };
}

/// Rewrapping dispatch over the plain fixed-width variants. Callers handle
/// the remaining variants before invoking.
macro_rules! map_fixed {
    ($col:expr, $c:ident => $body:expr) => {
        match $col {
            Column::Int8($c) => Column::Int8($body),
            Column::Int16($c) => Column::Int16($body),
            Column::Int32($c) => Column::Int32($body),
            Column::Int64($c) => Column::Int64($body),
            Column::Float32($c) => Column::Float32($body),
            Column::Float64($c) => Column::Float64($body),
            Column::Date($c) => Column::Date($body),
            Column::Time($c) => Column::Time($body),
            Column::Timestamp($c) => Column::Timestamp($body),
            Column::Uuid($c) => Column::Uuid($body),
            _ => unreachable!("non-fixed variant handled by caller"),
        }
    };
}

/// An immutable typed column.
///
/// The engine's public contract lives here: every operation the external
/// tabular container consumes dispatches through this union, and the
/// container never touches a backing block directly.
#[derive(Clone, Debug)]
pub enum Column {
    Bool(BoolColumn),
    Int8(FixedColumn<i8>),
    Int16(FixedColumn<i16>),
    Int32(FixedColumn<i32>),
    Int64(FixedColumn<i64>),
    Float32(FixedColumn<f32>),
    Float64(FixedColumn<f64>),
    Date(FixedColumn<i32>),
    Time(FixedColumn<i64>),
    Timestamp(FixedColumn<i64>),
    Decimal(DecimalColumn),
    Uuid(FixedColumn<[u8; 16]>),
    Str(VarLenColumn),
    Bytes(VarLenColumn),
    Nullable(NullableColumn),
}

impl Column {
    #[inline]
    pub fn len(&self) -> usize {
        with_families!(self, c => c.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Column::Bool(_) => ScalarType::Bool,
            Column::Int8(_) => ScalarType::Int8,
            Column::Int16(_) => ScalarType::Int16,
            Column::Int32(_) => ScalarType::Int32,
            Column::Int64(_) => ScalarType::Int64,
            Column::Float32(_) => ScalarType::Float32,
            Column::Float64(_) => ScalarType::Float64,
            Column::Date(_) => ScalarType::Date,
            Column::Time(_) => ScalarType::Time,
            Column::Timestamp(_) => ScalarType::Timestamp,
            Column::Decimal(_) => ScalarType::Decimal,
            Column::Uuid(_) => ScalarType::Uuid,
            Column::Str(_) => ScalarType::Text,
            Column::Bytes(_) => ScalarType::Blob,
            Column::Nullable(c) => c.scalar_type(),
        }
    }

    #[inline]
    pub fn characteristics(&self) -> Characteristics {
        with_families!(self, c => c.characteristics())
    }

    #[inline]
    pub fn is_nonnull(&self) -> bool {
        self.characteristics().is_nonnull()
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.characteristics().is_sorted()
    }

    #[inline]
    pub fn is_distinct(&self) -> bool {
        self.characteristics().is_distinct()
    }

    /// The value at `index`. Text and blob values borrow from the backing
    /// block.
    pub fn value(&self, index: usize) -> Result<Value<'_>> {
        match self {
            Column::Bool(c) => Ok(Value::Bool(c.get(index)?)),
            Column::Int8(c) => Ok(Value::Int8(c.get(index)?)),
            Column::Int16(c) => Ok(Value::Int16(c.get(index)?)),
            Column::Int32(c) => Ok(Value::Int32(c.get(index)?)),
            Column::Int64(c) => Ok(Value::Int64(c.get(index)?)),
            Column::Float32(c) => Ok(Value::Float32(c.get(index)?)),
            Column::Float64(c) => Ok(Value::Float64(c.get(index)?)),
            Column::Date(c) => Ok(Value::Date(c.get(index)?)),
            Column::Time(c) => Ok(Value::Time(c.get(index)?)),
            Column::Timestamp(c) => Ok(Value::Timestamp(c.get(index)?)),
            Column::Decimal(c) => Ok(Value::Decimal {
                digits: c.get(index)?,
                scale: c.scale(),
            }),
            Column::Uuid(c) => Ok(Value::Uuid(c.get(index)?)),
            Column::Str(c) => Ok(Value::Text(Cow::Borrowed(c.get_str(index)?))),
            Column::Bytes(c) => Ok(Value::Blob(Cow::Borrowed(c.get_bytes(index)?))),
            Column::Nullable(c) => c.value(index),
        }
    }

    pub fn first(&self) -> Result<Option<Value<'_>>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.value(0).map(Some)
    }

    pub fn last(&self) -> Result<Option<Value<'_>>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.value(self.len() - 1).map(Some)
    }

    /// O(1) shared-block view over `from..to`.
    pub fn sub_column(&self, from: usize, to: usize) -> Result<Column> {
        Ok(map_families!(self, c => c.sub_column(from, to)?))
    }

    /// Deep copy sized to this view.
    pub fn copy(&self) -> Column {
        map_families!(self, c => c.copy())
    }

    /// Strips order claims without copying.
    pub fn to_heap(&self) -> Column {
        map_families!(self, c => c.to_heap())
    }

    /// Produces a SORTED column: relabel when the bytes are already
    /// ordered, copy-and-sort otherwise. Not defined for boolean or
    /// nullable columns.
    pub fn to_sorted(&self) -> Result<Column> {
        match self {
            Column::Bool(_) => Err(BoolColumn::order_unsupported("to_sorted")),
            Column::Nullable(_) => bail!("to_sorted requires a non-null column"),
            Column::Decimal(c) => Ok(Column::Decimal(c.to_sorted())),
            Column::Str(c) => Ok(Column::Str(c.to_sorted())),
            Column::Bytes(c) => Ok(Column::Bytes(c.to_sorted())),
            other => Ok(map_fixed!(other, c => c.to_sorted())),
        }
    }

    /// Produces a DISTINCT column: relabel, deduplicate, or
    /// copy-sort-deduplicate, whichever the current bytes allow.
    pub fn to_distinct(&self) -> Result<Column> {
        match self {
            Column::Bool(_) => Err(BoolColumn::order_unsupported("to_distinct")),
            Column::Nullable(_) => bail!("to_distinct requires a non-null column"),
            Column::Decimal(c) => Ok(Column::Decimal(c.to_distinct())),
            Column::Str(c) => Ok(Column::Str(c.to_distinct())),
            Column::Bytes(c) => Ok(Column::Bytes(c.to_distinct())),
            other => Ok(map_fixed!(other, c => c.to_distinct())),
        }
    }

    /// Searches for `target`; see [`SearchOutcome`] for hit/miss encoding.
    pub fn search(&self, target: &Value<'_>, find_first: bool) -> Result<SearchOutcome> {
        match (self, target) {
            (Column::Nullable(n), t) => n.search(t, find_first),
            (_, Value::Null) => bail!("cannot search for null in a non-null column"),
            (Column::Bool(c), Value::Bool(v)) => Ok(c.search(*v, find_first)),
            (Column::Int8(c), Value::Int8(v)) => Ok(c.search(*v, find_first)),
            (Column::Int16(c), Value::Int16(v)) => Ok(c.search(*v, find_first)),
            (Column::Int32(c), Value::Int32(v)) => Ok(c.search(*v, find_first)),
            (Column::Int64(c), Value::Int64(v)) => Ok(c.search(*v, find_first)),
            (Column::Float32(c), Value::Float32(v)) => Ok(c.search(*v, find_first)),
            (Column::Float64(c), Value::Float64(v)) => Ok(c.search(*v, find_first)),
            (Column::Date(c), Value::Date(v)) => Ok(c.search(*v, find_first)),
            (Column::Time(c), Value::Time(v)) => Ok(c.search(*v, find_first)),
            (Column::Timestamp(c), Value::Timestamp(v)) => Ok(c.search(*v, find_first)),
            (Column::Decimal(c), Value::Decimal { digits, scale }) => {
                c.check_value_scale(*scale)?;
                Ok(c.search(*digits, find_first))
            }
            (Column::Uuid(c), Value::Uuid(v)) => Ok(c.search(*v, find_first)),
            (Column::Str(c), Value::Text(v)) => Ok(c.search(v.as_bytes(), find_first)),
            (Column::Bytes(c), Value::Blob(v)) => Ok(c.search(v.as_ref(), find_first)),
            (col, t) => bail!(
                "value of kind {:?} does not match column of type {}",
                t.scalar_type(),
                col.scalar_type()
            ),
        }
    }

    /// Index of the first occurrence of `target`, if present.
    pub fn index_of(&self, target: &Value<'_>) -> Result<Option<usize>> {
        Ok(self.search(target, true)?.found())
    }

    /// Index of the last occurrence of `target`, if present.
    pub fn last_index_of(&self, target: &Value<'_>) -> Result<Option<usize>> {
        Ok(self.search(target, false)?.found())
    }

    fn require_order(&self, op: &str, distinct: bool) -> Result<()> {
        match self {
            Column::Bool(_) => return Err(BoolColumn::order_unsupported(op)),
            Column::Nullable(_) => bail!("{op} requires a non-null column"),
            _ => {}
        }
        if distinct {
            ensure!(
                self.is_distinct(),
                "{op} requires a distinct column, got {:?}",
                self.characteristics()
            );
        } else {
            ensure!(
                self.is_sorted(),
                "{op} requires a sorted column, got {:?}",
                self.characteristics()
            );
        }
        Ok(())
    }

    /// Greatest value at or below `target`. Requires DISTINCT.
    pub fn floor(&self, target: &Value<'_>) -> Result<Option<Value<'_>>> {
        self.require_order("floor", true)?;
        match self.search(target, true)? {
            SearchOutcome::Found(i) => self.value(i).map(Some),
            SearchOutcome::Insertion(i) if i > 0 => self.value(i - 1).map(Some),
            SearchOutcome::Insertion(_) => Ok(None),
        }
    }

    /// Least value at or above `target`. Requires DISTINCT.
    pub fn ceiling(&self, target: &Value<'_>) -> Result<Option<Value<'_>>> {
        self.require_order("ceiling", true)?;
        match self.search(target, true)? {
            SearchOutcome::Found(i) => self.value(i).map(Some),
            SearchOutcome::Insertion(i) if i < self.len() => self.value(i).map(Some),
            SearchOutcome::Insertion(_) => Ok(None),
        }
    }

    /// Greatest value strictly below `target`. Requires DISTINCT.
    pub fn lower(&self, target: &Value<'_>) -> Result<Option<Value<'_>>> {
        self.require_order("lower", true)?;
        let boundary = self.search(target, true)?.index();
        if boundary > 0 {
            self.value(boundary - 1).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Least value strictly above `target`. Requires DISTINCT.
    pub fn higher(&self, target: &Value<'_>) -> Result<Option<Value<'_>>> {
        self.require_order("higher", true)?;
        match self.search(target, true)? {
            SearchOutcome::Found(i) if i + 1 < self.len() => self.value(i + 1).map(Some),
            SearchOutcome::Found(_) => Ok(None),
            SearchOutcome::Insertion(i) if i < self.len() => self.value(i).map(Some),
            SearchOutcome::Insertion(_) => Ok(None),
        }
    }

    /// View of the inclusive value range `from..=to`. Requires SORTED.
    pub fn sub_column_by_value(&self, from: &Value<'_>, to: &Value<'_>) -> Result<Column> {
        self.require_order("sub_column_by_value", false)?;
        ensure!(
            from.compare(to)? != Ordering::Greater,
            "malformed value range: from exceeds to"
        );
        let lo = self.search(from, true)?.index();
        let hi = match self.search(to, false)? {
            SearchOutcome::Found(i) => i + 1,
            SearchOutcome::Insertion(i) => i,
        };
        self.sub_column(lo, hi.max(lo))
    }

    /// View of every value strictly below `bound`. Requires SORTED.
    pub fn head(&self, bound: &Value<'_>) -> Result<Column> {
        self.require_order("head", false)?;
        let cut = self.search(bound, true)?.index();
        self.sub_column(0, cut)
    }

    /// View of every value at or above `bound`. Requires SORTED.
    pub fn tail(&self, bound: &Value<'_>) -> Result<Column> {
        self.require_order("tail", false)?;
        let cut = self.search(bound, true)?.index();
        self.sub_column(cut, self.len())
    }

    /// Filters by a keep-mask with its cardinality; see the set-algebra
    /// layer for the degenerate fast paths.
    pub fn filter(&self, keep: &BitSlice<u64, Lsb0>, cardinality: usize) -> Result<Column> {
        crate::algebra::filter(self, keep, cardinality)
    }

    /// Gathers by an index list; output carries the non-null claim only.
    pub fn select(&self, indices: &[usize]) -> Result<Column> {
        crate::algebra::select(self, indices)
    }

    /// Ordered concatenation; see the set-algebra layer for the guards.
    pub fn append(&self, other: &Column) -> Result<Column> {
        crate::algebra::append(self, other)
    }

    /// Concatenation that first widens `other` losslessly to this column's
    /// kind (narrow cast-or-fail).
    pub fn append_coercing(&self, other: &Column) -> Result<Column> {
        crate::algebra::append_coercing(self, other)
    }

    /// Kept-positions copy without degenerate-case handling. The set-algebra
    /// layer validates the mask before calling.
    pub(crate) fn filter_kept(&self, keep: &BitSlice<u64, Lsb0>) -> Column {
        map_families!(self, c => c.filter_kept(keep))
    }

    /// Gather used by families that compose columns; bounds are validated
    /// per family.
    pub(crate) fn select_impl(&self, indices: &[usize]) -> Result<Column> {
        Ok(map_families!(self, c => c.select(indices)?))
    }

    /// Whether the stored bytes are non-decreasing, independent of the
    /// declared characteristics. The join layer uses this to admit the
    /// dense side of a nullable column, which can never carry the flag.
    pub(crate) fn bytes_sorted(&self) -> bool {
        match self {
            Column::Bool(_) => false,
            Column::Decimal(c) => c.is_sorted_run(),
            Column::Str(c) | Column::Bytes(c) => c.is_sorted_run(),
            Column::Nullable(n) => n.dense().bytes_sorted(),
            Column::Int8(c) => c.is_sorted_run(),
            Column::Int16(c) => c.is_sorted_run(),
            Column::Int32(c) => c.is_sorted_run(),
            Column::Int64(c) => c.is_sorted_run(),
            Column::Float32(c) => c.is_sorted_run(),
            Column::Float64(c) => c.is_sorted_run(),
            Column::Date(c) => c.is_sorted_run(),
            Column::Time(c) => c.is_sorted_run(),
            Column::Timestamp(c) => c.is_sorted_run(),
            Column::Uuid(c) => c.is_sorted_run(),
        }
    }

    crate::column_primitive_getters! {
        i8 => Int8: i8,
        i16 => Int16: i16,
        i32 => Int32: i32,
        i64 => Int64: i64,
        f32 => Float32: f32,
        f64 => Float64: f64,
        date => Date: i32,
        time => Time: i64,
        timestamp => Timestamp: i64,
        uuid => Uuid: [u8; 16],
    }

    /// Reads the boolean at `index`.
    pub fn get_bool(&self, index: usize) -> Result<bool> {
        match self {
            Column::Bool(c) => c.get(index),
            Column::Nullable(n) => {
                let physical = n.require_present(index)?;
                match n.dense() {
                    Column::Bool(c) => c.get(physical),
                    other => bail!(
                        "column of type {} has no get_bool accessor",
                        other.scalar_type()
                    ),
                }
            }
            other => bail!(
                "column of type {} has no get_bool accessor",
                other.scalar_type()
            ),
        }
    }

    /// Reads the text at `index`, borrowing from the backing block.
    pub fn get_str(&self, index: usize) -> Result<&str> {
        match self {
            Column::Str(c) => c.get_str(index),
            Column::Nullable(n) => {
                let physical = n.require_present(index)?;
                match n.dense() {
                    Column::Str(c) => c.get_str(physical),
                    other => bail!(
                        "column of type {} has no get_str accessor",
                        other.scalar_type()
                    ),
                }
            }
            other => bail!(
                "column of type {} has no get_str accessor",
                other.scalar_type()
            ),
        }
    }

    /// Reads the blob at `index`, borrowing from the backing block.
    pub fn get_bytes(&self, index: usize) -> Result<&[u8]> {
        match self {
            Column::Bytes(c) => c.get_bytes(index),
            Column::Nullable(n) => {
                let physical = n.require_present(index)?;
                match n.dense() {
                    Column::Bytes(c) => c.get_bytes(physical),
                    other => bail!(
                        "column of type {} has no get_bytes accessor",
                        other.scalar_type()
                    ),
                }
            }
            other => bail!(
                "column of type {} has no get_bytes accessor",
                other.scalar_type()
            ),
        }
    }

    /// Reads the unscaled decimal digits at `index`.
    pub fn get_decimal(&self, index: usize) -> Result<i128> {
        match self {
            Column::Decimal(c) => c.get(index),
            Column::Nullable(n) => {
                let physical = n.require_present(index)?;
                match n.dense() {
                    Column::Decimal(c) => c.get(physical),
                    other => bail!(
                        "column of type {} has no get_decimal accessor",
                        other.scalar_type()
                    ),
                }
            }
            other => bail!(
                "column of type {} has no get_decimal accessor",
                other.scalar_type()
            ),
        }
    }

    /// The scale of a decimal column.
    pub fn decimal_scale(&self) -> Result<u8> {
        match self {
            Column::Decimal(c) => Ok(c.scale()),
            Column::Nullable(n) => match n.dense() {
                Column::Decimal(c) => Ok(c.scale()),
                other => bail!("column of type {} has no decimal scale", other.scalar_type()),
            },
            other => bail!("column of type {} has no decimal scale", other.scalar_type()),
        }
    }

    /// Sorted-merge intersection; see the join layer.
    pub fn intersect_sorted(&self, other: &Column) -> Result<crate::join::MergeIntersection> {
        crate::join::intersect_sorted(self, other)
    }

    /// Binary-search intersection against this column as a unique sorted
    /// index; see the join layer.
    pub fn intersect_with_index(&self, probe: &Column) -> Result<crate::join::ProbeIntersection> {
        crate::join::intersect_with_index(self, probe)
    }
}

impl PartialEq for Column {
    /// Content equality. Characteristics are not compared; a nullable
    /// column equals a non-null column exactly when it has no nulls and the
    /// present values match.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Column::Nullable(a), Column::Nullable(b)) => a == b,
            (Column::Nullable(a), b) => a.content_equals_nonnull(b),
            (a, Column::Nullable(b)) => b.content_equals_nonnull(a),
            (Column::Bool(a), Column::Bool(b)) => a == b,
            (Column::Int8(a), Column::Int8(b)) => a == b,
            (Column::Int16(a), Column::Int16(b)) => a == b,
            (Column::Int32(a), Column::Int32(b)) => a == b,
            (Column::Int64(a), Column::Int64(b)) => a == b,
            (Column::Float32(a), Column::Float32(b)) => a == b,
            (Column::Float64(a), Column::Float64(b)) => a == b,
            (Column::Date(a), Column::Date(b)) => a == b,
            (Column::Time(a), Column::Time(b)) => a == b,
            (Column::Timestamp(a), Column::Timestamp(b)) => a == b,
            (Column::Decimal(a), Column::Decimal(b)) => a == b,
            (Column::Uuid(a), Column::Uuid(b)) => a == b,
            (Column::Str(a), Column::Str(b)) => a == b,
            (Column::Bytes(a), Column::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.scalar_type() as u8).hash(state);
        self.len().hash(state);
        for i in 0..self.len() {
            if let Ok(v) = self.value(i) {
                v.hash(state);
            }
        }
    }
}
