//! # Characteristics Lattice
//!
//! Columns declare structural guarantees as a bitmask over
//! {NONNULL, SORTED, DISTINCT} with the implication chain
//! `DISTINCT ⇒ SORTED ⇒ NONNULL`:
//!
//! ```text
//! NULLABLE (0b000)  --  may contain nulls, no order claim
//!    |
//! NONNULL  (0b001)  --  heap: every position holds a value
//!    |
//! SORTED   (0b011)  --  non-decreasing under the kind's total order
//!    |
//! DISTINCT (0b111)  --  strictly increasing
//! ```
//!
//! Only the four lattice points are representable; any other bit pattern is
//! rejected at construction. The bitmask is what the file header serializes.

use eyre::{ensure, Result};

const NONNULL_BIT: u8 = 0b001;
const SORTED_BIT: u8 = 0b010;
const DISTINCT_BIT: u8 = 0b100;

/// Structural guarantees of a column.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Characteristics(u8);

impl Characteristics {
    /// May contain nulls; no claims at all.
    pub const NULLABLE: Self = Self(0);
    /// Every position holds a value.
    pub const NONNULL: Self = Self(NONNULL_BIT);
    /// Non-null and non-decreasing.
    pub const SORTED: Self = Self(NONNULL_BIT | SORTED_BIT);
    /// Non-null and strictly increasing.
    pub const DISTINCT: Self = Self(NONNULL_BIT | SORTED_BIT | DISTINCT_BIT);

    /// Validates a bitmask read from the wire or a builder argument.
    pub fn from_bits(bits: u8) -> Result<Self> {
        let chars = Self(bits);
        ensure!(
            matches!(
                chars,
                Self::NULLABLE | Self::NONNULL | Self::SORTED | Self::DISTINCT
            ),
            "invalid characteristics combination: {bits:#05b}"
        );
        Ok(chars)
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_nonnull(self) -> bool {
        self.0 & NONNULL_BIT != 0
    }

    #[inline]
    pub fn is_sorted(self) -> bool {
        self.0 & SORTED_BIT != 0
    }

    #[inline]
    pub fn is_distinct(self) -> bool {
        self.0 & DISTINCT_BIT != 0
    }

    /// Drops order claims, keeping non-nullness. The relabeling behind
    /// `to_heap`: no bytes move.
    #[inline]
    pub fn strip_order(self) -> Self {
        Self(self.0 & NONNULL_BIT)
    }
}

impl std::fmt::Debug for Characteristics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match *self {
            Self::NULLABLE => "NULLABLE",
            Self::NONNULL => "NONNULL",
            Self::SORTED => "SORTED",
            Self::DISTINCT => "DISTINCT",
            _ => "INVALID",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_implications_hold() {
        assert!(Characteristics::DISTINCT.is_sorted());
        assert!(Characteristics::DISTINCT.is_nonnull());
        assert!(Characteristics::SORTED.is_nonnull());
        assert!(!Characteristics::SORTED.is_distinct());
        assert!(!Characteristics::NONNULL.is_sorted());
        assert!(!Characteristics::NULLABLE.is_nonnull());
    }

    #[test]
    fn only_lattice_points_are_valid() {
        for bits in 0u8..8 {
            let result = Characteristics::from_bits(bits);
            match bits {
                0b000 | 0b001 | 0b011 | 0b111 => assert!(result.is_ok()),
                _ => assert!(
                    result.unwrap_err().to_string().contains("invalid"),
                    "bits {bits:#05b} should be rejected"
                ),
            }
        }
    }

    #[test]
    fn strip_order_keeps_nonnull() {
        assert_eq!(Characteristics::DISTINCT.strip_order(), Characteristics::NONNULL);
        assert_eq!(Characteristics::SORTED.strip_order(), Characteristics::NONNULL);
        assert_eq!(Characteristics::NULLABLE.strip_order(), Characteristics::NULLABLE);
    }
}
