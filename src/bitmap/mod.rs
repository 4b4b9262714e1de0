//! # Bitmaps
//!
//! Bit-level structures shared across the engine, built on `bitvec`:
//!
//! - [`Mask`]: a dense positional keep-set. The filter operation consumes a
//!   mask plus its cardinality; both join primitives produce masks.
//! - [`PresenceMap`]: the null map of a nullable column (one bit per
//!   logical position, set when a value is present) together with a
//!   per-word prefix-count cache of absent bits that makes the
//!   logical-to-physical translation sub-linear.
//!
//! ## Rank Cache Layout
//!
//! ```text
//! bits:          |  word 0 (64 bits)  |  word 1  |  word 2  | ...
//! absent_before: |  0                 |  a(0)    |  a(0..2) | ...
//! ```
//!
//! `absent_before[w]` holds the number of absent (clear) bits strictly below
//! word `w`. Translating a logical index then costs one cache lookup plus
//! one masked popcount. Counters are uniform `u32` prefix sums for every
//! nullable kind.

mod presence;

pub use presence::PresenceMap;

use bitvec::prelude::*;

/// Dense positional keep-set.
pub type Mask = BitVec<u64, Lsb0>;

/// A mask of `len` kept positions.
pub fn mask_ones(len: usize) -> Mask {
    bitvec![u64, Lsb0; 1; len]
}

/// A mask of `len` dropped positions.
pub fn mask_zeros(len: usize) -> Mask {
    bitvec![u64, Lsb0; 0; len]
}

/// Builds a mask of `len` bits with the given positions set.
pub fn mask_from_positions(len: usize, positions: &[usize]) -> Mask {
    let mut mask = mask_zeros(len);
    for &pos in positions {
        mask.set(pos, true);
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_from_positions_sets_requested_bits() {
        let mask = mask_from_positions(6, &[1, 4]);
        assert_eq!(mask.count_ones(), 2);
        assert!(mask[1]);
        assert!(mask[4]);
        assert!(!mask[0]);
    }
}
