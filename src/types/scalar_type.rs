//! # Scalar Types
//!
//! The canonical type enum for column elements.
//!
//! ## Type Categories
//!
//! | Category | Types | Storage |
//! |----------|-------|---------|
//! | **Boolean** | Bool | bit-packed block |
//! | **Integer** | Int8, Int16, Int32, Int64 | 1, 2, 4, 8 bytes |
//! | **Float** | Float32, Float64 | 4, 8 bytes |
//! | **Temporal** | Date, Time, Timestamp | 4 (days), 8 (micros), 8 (micros) |
//! | **Numeric** | Decimal | 16 bytes (i128 digits, column-level scale) |
//! | **Identifier** | Uuid | 16 bytes |
//! | **Variable** | Text, Blob | element bytes + pointer array |
//!
//! Discriminants are grouped by category and stable: they double as the
//! on-wire type tag. The string codes are what the file header records.

use eyre::{bail, Result};

/// Canonical element type of a column.
///
/// `#[repr(u8)]` keeps the discriminant single-byte for wire encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool = 0,

    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,

    Float32 = 10,
    Float64 = 11,

    Date = 20,
    Time = 21,
    Timestamp = 22,

    Decimal = 30,

    Uuid = 40,

    Text = 50,
    Blob = 51,
}

impl ScalarType {
    /// Byte width of one element slot, or None for bit-packed booleans and
    /// variable-length kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ScalarType::Int8 => Some(1),
            ScalarType::Int16 => Some(2),
            ScalarType::Int32 | ScalarType::Date => Some(4),
            ScalarType::Int64 | ScalarType::Time | ScalarType::Timestamp => Some(8),
            ScalarType::Float32 => Some(4),
            ScalarType::Float64 => Some(8),
            ScalarType::Decimal | ScalarType::Uuid => Some(16),
            ScalarType::Bool | ScalarType::Text | ScalarType::Blob => None,
        }
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, ScalarType::Text | ScalarType::Blob)
    }

    /// Whether the kind participates in ordering at all. Booleans opt out:
    /// sortedness, range navigation, and intersection are undefined on them.
    #[inline]
    pub fn supports_order(&self) -> bool {
        !matches!(self, ScalarType::Bool)
    }

    /// The stable string code recorded in file headers.
    pub fn code(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "i8",
            ScalarType::Int16 => "i16",
            ScalarType::Int32 => "i32",
            ScalarType::Int64 => "i64",
            ScalarType::Float32 => "f32",
            ScalarType::Float64 => "f64",
            ScalarType::Date => "date",
            ScalarType::Time => "time",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Decimal => "decimal",
            ScalarType::Uuid => "uuid",
            ScalarType::Text => "text",
            ScalarType::Blob => "blob",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        Ok(match code {
            "bool" => ScalarType::Bool,
            "i8" => ScalarType::Int8,
            "i16" => ScalarType::Int16,
            "i32" => ScalarType::Int32,
            "i64" => ScalarType::Int64,
            "f32" => ScalarType::Float32,
            "f64" => ScalarType::Float64,
            "date" => ScalarType::Date,
            "time" => ScalarType::Time,
            "timestamp" => ScalarType::Timestamp,
            "decimal" => ScalarType::Decimal,
            "uuid" => ScalarType::Uuid,
            "text" => ScalarType::Text,
            "blob" => ScalarType::Blob,
            other => bail!("unknown scalar type code: {other:?}"),
        })
    }

    pub fn from_discriminant(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => ScalarType::Bool,
            1 => ScalarType::Int8,
            2 => ScalarType::Int16,
            3 => ScalarType::Int32,
            4 => ScalarType::Int64,
            10 => ScalarType::Float32,
            11 => ScalarType::Float64,
            20 => ScalarType::Date,
            21 => ScalarType::Time,
            22 => ScalarType::Timestamp,
            30 => ScalarType::Decimal,
            40 => ScalarType::Uuid,
            50 => ScalarType::Text,
            51 => ScalarType::Blob,
            other => bail!("unknown scalar type discriminant: {other}"),
        })
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_sizes_match_storage_layout() {
        assert_eq!(ScalarType::Int8.fixed_size(), Some(1));
        assert_eq!(ScalarType::Int16.fixed_size(), Some(2));
        assert_eq!(ScalarType::Int32.fixed_size(), Some(4));
        assert_eq!(ScalarType::Int64.fixed_size(), Some(8));
        assert_eq!(ScalarType::Float32.fixed_size(), Some(4));
        assert_eq!(ScalarType::Float64.fixed_size(), Some(8));
        assert_eq!(ScalarType::Date.fixed_size(), Some(4));
        assert_eq!(ScalarType::Time.fixed_size(), Some(8));
        assert_eq!(ScalarType::Timestamp.fixed_size(), Some(8));
        assert_eq!(ScalarType::Decimal.fixed_size(), Some(16));
        assert_eq!(ScalarType::Uuid.fixed_size(), Some(16));
        assert_eq!(ScalarType::Bool.fixed_size(), None);
        assert_eq!(ScalarType::Text.fixed_size(), None);
        assert_eq!(ScalarType::Blob.fixed_size(), None);
    }

    #[test]
    fn codes_round_trip() {
        for ty in [
            ScalarType::Bool,
            ScalarType::Int8,
            ScalarType::Int16,
            ScalarType::Int32,
            ScalarType::Int64,
            ScalarType::Float32,
            ScalarType::Float64,
            ScalarType::Date,
            ScalarType::Time,
            ScalarType::Timestamp,
            ScalarType::Decimal,
            ScalarType::Uuid,
            ScalarType::Text,
            ScalarType::Blob,
        ] {
            assert_eq!(ScalarType::from_code(ty.code()).unwrap(), ty);
            assert_eq!(ScalarType::from_discriminant(ty as u8).unwrap(), ty);
        }
        assert!(ScalarType::from_code("varchar").is_err());
        assert!(ScalarType::from_discriminant(99).is_err());
    }

    #[test]
    fn booleans_opt_out_of_ordering() {
        assert!(!ScalarType::Bool.supports_order());
        assert!(ScalarType::Int32.supports_order());
        assert!(ScalarType::Text.supports_order());
    }
}
