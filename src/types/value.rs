//! # Runtime Value Representation
//!
//! [`Value`] is the boxed-free runtime representation handed across the
//! engine boundary. Text and blob variants borrow from the column's backing
//! block via `Cow`, so reading a value out of a column allocates nothing.
//!
//! ## Comparison Semantics
//!
//! Comparison is defined within one scalar kind only; the engine never
//! coerces across kinds. Floats use IEEE total ordering, decimals compare
//! their unscaled digits once scales agree, UUIDs and variable-length kinds
//! compare lexicographically. Null never compares: ordering against a null
//! is an argument error at the call site that produced it.

use crate::types::ScalarType;
use eyre::{bail, Result};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Days since the epoch.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    /// Microseconds since the epoch.
    Timestamp(i64),
    /// Unscaled digits; the scale is declared by the owning column.
    Decimal { digits: i128, scale: u8 },
    Uuid([u8; 16]),
    Text(Cow<'a, str>),
    Blob(Cow<'a, [u8]>),
}

impl<'a> Value<'a> {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The scalar kind of this value, or None for null.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ScalarType::Bool,
            Value::Int8(_) => ScalarType::Int8,
            Value::Int16(_) => ScalarType::Int16,
            Value::Int32(_) => ScalarType::Int32,
            Value::Int64(_) => ScalarType::Int64,
            Value::Float32(_) => ScalarType::Float32,
            Value::Float64(_) => ScalarType::Float64,
            Value::Date(_) => ScalarType::Date,
            Value::Time(_) => ScalarType::Time,
            Value::Timestamp(_) => ScalarType::Timestamp,
            Value::Decimal { .. } => ScalarType::Decimal,
            Value::Uuid(_) => ScalarType::Uuid,
            Value::Text(_) => ScalarType::Text,
            Value::Blob(_) => ScalarType::Blob,
        })
    }

    /// Total-order comparison within one scalar kind.
    pub fn compare(&self, other: &Value<'_>) -> Result<Ordering> {
        Ok(match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int8(a), Value::Int8(b)) => a.cmp(b),
            (Value::Int16(a), Value::Int16(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float32(a), Value::Float32(b)) => a.total_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (
                Value::Decimal { digits: a, scale: sa },
                Value::Decimal { digits: b, scale: sb },
            ) => {
                if sa != sb {
                    bail!("mismatched decimal scales: {sa} vs {sb}");
                }
                a.cmp(b)
            }
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Blob(a), Value::Blob(b)) => a.as_ref().cmp(b.as_ref()),
            (a, b) => bail!(
                "cannot compare {:?} with {:?}",
                a.scalar_type(),
                b.scalar_type()
            ),
        })
    }

    /// Severs any borrow into column memory.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(v),
            Value::Int8(v) => Value::Int8(v),
            Value::Int16(v) => Value::Int16(v),
            Value::Int32(v) => Value::Int32(v),
            Value::Int64(v) => Value::Int64(v),
            Value::Float32(v) => Value::Float32(v),
            Value::Float64(v) => Value::Float64(v),
            Value::Date(v) => Value::Date(v),
            Value::Time(v) => Value::Time(v),
            Value::Timestamp(v) => Value::Timestamp(v),
            Value::Decimal { digits, scale } => Value::Decimal { digits, scale },
            Value::Uuid(v) => Value::Uuid(v),
            Value::Text(v) => Value::Text(Cow::Owned(v.into_owned())),
            Value::Blob(v) => Value::Blob(Cow::Owned(v.into_owned())),
        }
    }
}

impl Hash for Value<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Int8(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float32(v) => v.to_bits().hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::Date(v) => v.hash(state),
            Value::Time(v) => v.hash(state),
            Value::Timestamp(v) => v.hash(state),
            Value::Decimal { digits, scale } => {
                digits.hash(state);
                scale.hash(state);
            }
            Value::Uuid(v) => v.hash(state),
            Value::Text(v) => v.as_bytes().hash(state),
            Value::Blob(v) => v.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_comparison_orders_values() {
        assert_eq!(
            Value::Int32(3).compare(&Value::Int32(5)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Value::Text(Cow::Borrowed("b"))
                .compare(&Value::Text(Cow::Borrowed("a")))
                .unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn float_comparison_is_total() {
        assert_eq!(
            Value::Float64(f64::NAN)
                .compare(&Value::Float64(f64::INFINITY))
                .unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn cross_kind_comparison_is_rejected() {
        let err = Value::Int32(1).compare(&Value::Int64(1)).unwrap_err();
        assert!(err.to_string().contains("cannot compare"));
    }

    #[test]
    fn decimal_comparison_requires_matching_scale() {
        let a = Value::Decimal { digits: 150, scale: 2 };
        let b = Value::Decimal { digits: 15, scale: 1 };
        assert!(a.compare(&b).is_err());
        let c = Value::Decimal { digits: 140, scale: 2 };
        assert_eq!(a.compare(&c).unwrap(), Ordering::Greater);
    }
}
