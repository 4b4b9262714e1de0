//! The null map: a presence bitmap with an absent-bit rank cache.

use bitvec::prelude::*;
use eyre::{ensure, Result};

const WORD_BITS: usize = 64;

/// Presence bitmap over the logical positions of a nullable column.
///
/// A set bit marks a present value; a clear bit marks a null. The map is
/// immutable once constructed and carries `absent_before`, the running total
/// of absent bits strictly below each 64-bit word boundary, so
/// [`PresenceMap::non_null_index`] runs in O(1) after construction.
#[derive(Clone)]
pub struct PresenceMap {
    bits: BitBox<u64, Lsb0>,
    absent_before: Box<[u32]>,
    len: usize,
    present: usize,
}

impl PresenceMap {
    /// Builds the map and its rank cache from a presence bitmap.
    pub fn from_bits(bits: BitVec<u64, Lsb0>) -> Self {
        let len = bits.len();
        let words = bits.as_raw_slice();
        let mut absent_before = Vec::with_capacity(words.len());
        let mut absent = 0u32;
        for (w, &word) in words.iter().enumerate() {
            absent_before.push(absent);
            let in_word = Self::word_bits(len, w);
            let present = (word & Self::word_mask(len, w)).count_ones();
            absent += in_word as u32 - present;
        }
        let present = len - absent as usize;
        Self {
            bits: bits.into_boxed_bitslice(),
            absent_before: absent_before.into_boxed_slice(),
            len,
            present,
        }
    }

    /// Reconstructs a map from packed little-endian bitmap bytes.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Result<Self> {
        ensure!(
            bytes.len() == len.div_ceil(8),
            "presence bitmap of {} bytes does not cover {} positions",
            bytes.len(),
            len
        );
        let mut words = vec![0u64; len.div_ceil(WORD_BITS)];
        for (i, &byte) in bytes.iter().enumerate() {
            words[i / 8] |= (byte as u64) << ((i % 8) * 8);
        }
        let mut bits = BitVec::from_vec(words);
        bits.truncate(len);
        Ok(Self::from_bits(bits))
    }

    /// Packs the bitmap into little-endian bytes, `(len + 7) / 8` of them.
    pub fn to_bytes(&self) -> Vec<u8> {
        let nbytes = self.len.div_ceil(8);
        let mut out = vec![0u8; nbytes];
        for (w, &word) in self.bits.as_raw_slice().iter().enumerate() {
            let word = word & Self::word_mask(self.len, w);
            for (b, byte) in word.to_le_bytes().iter().enumerate() {
                let i = w * 8 + b;
                if i < nbytes {
                    out[i] = *byte;
                }
            }
        }
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn present_count(&self) -> usize {
        self.present
    }

    #[inline]
    pub fn absent_count(&self) -> usize {
        self.len - self.present
    }

    #[inline]
    pub fn is_present(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Physical position of `logical` within the null-free sub-sequence:
    /// the logical index minus the absent-bit count strictly below it.
    ///
    /// Every nullable accessor funnels through this hook. For an absent
    /// position the result is the physical slot the value would occupy.
    #[inline]
    pub fn non_null_index(&self, logical: usize) -> usize {
        debug_assert!(logical <= self.len);
        let word = logical / WORD_BITS;
        let bit = logical % WORD_BITS;
        let mut absent = match self.absent_before.get(word) {
            Some(&a) => a as usize,
            None => return logical - (self.len - self.present),
        };
        if bit > 0 {
            let below = self.bits.as_raw_slice()[word]
                & Self::word_mask(self.len, word)
                & ((1u64 << bit) - 1);
            absent += bit.min(Self::word_bits(self.len, word)) - below.count_ones() as usize;
        }
        logical - absent
    }

    /// Logical index of the `k`-th present bit, the inverse of
    /// [`PresenceMap::non_null_index`] on present positions.
    pub fn logical_index(&self, k: usize) -> Result<usize> {
        ensure!(
            k < self.present,
            "present rank {} out of range for {} present values",
            k,
            self.present
        );
        // Last word whose present-prefix does not exceed k.
        let words = self.absent_before.len();
        let (mut lo, mut hi) = (0usize, words);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.present_below_word(mid) <= k {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let word = lo - 1;
        let mut remaining = k - self.present_below_word(word);
        let mut bits = self.bits.as_raw_slice()[word] & Self::word_mask(self.len, word);
        loop {
            let next = bits.trailing_zeros() as usize;
            if remaining == 0 {
                return Ok(word * WORD_BITS + next);
            }
            bits &= bits - 1;
            remaining -= 1;
        }
    }

    pub fn first_present(&self) -> Option<usize> {
        self.bits.first_one()
    }

    pub fn last_present(&self) -> Option<usize> {
        self.bits.last_one()
    }

    pub fn first_absent(&self) -> Option<usize> {
        self.bits.first_zero()
    }

    pub fn last_absent(&self) -> Option<usize> {
        self.bits.last_zero()
    }

    pub fn iter_present(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    pub fn as_bitslice(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }

    /// Sub-map covering logical positions `from..to`.
    pub fn sub(&self, from: usize, to: usize) -> Self {
        Self::from_bits(self.bits[from..to].to_bitvec())
    }

    /// Concatenation of two maps.
    pub fn concat(&self, other: &Self) -> Self {
        let mut bits = self.bits.to_bitvec();
        bits.extend_from_bitslice(&other.bits);
        Self::from_bits(bits)
    }

    #[inline]
    fn present_below_word(&self, word: usize) -> usize {
        (word * WORD_BITS).min(self.len) - self.absent_before[word] as usize
    }

    /// Number of in-range bits in word `w` of a map of `len` bits.
    #[inline]
    fn word_bits(len: usize, w: usize) -> usize {
        (len - w * WORD_BITS).min(WORD_BITS)
    }

    /// Mask selecting the in-range bits of word `w`.
    #[inline]
    fn word_mask(len: usize, w: usize) -> u64 {
        let in_word = Self::word_bits(len, w);
        if in_word == WORD_BITS {
            u64::MAX
        } else {
            (1u64 << in_word) - 1
        }
    }
}

impl std::fmt::Debug for PresenceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceMap")
            .field("len", &self.len)
            .field("present", &self.present)
            .finish()
    }
}

impl PartialEq for PresenceMap {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::mask_from_positions;

    fn map_of(len: usize, present: &[usize]) -> PresenceMap {
        PresenceMap::from_bits(mask_from_positions(len, present))
    }

    #[test]
    fn non_null_index_subtracts_absent_below() {
        // [null, 5, null, 7]
        let map = map_of(4, &[1, 3]);
        assert_eq!(map.non_null_index(0), 0);
        assert_eq!(map.non_null_index(1), 0);
        assert_eq!(map.non_null_index(2), 1);
        assert_eq!(map.non_null_index(3), 1);
    }

    #[test]
    fn logical_index_inverts_non_null_index() {
        let map = map_of(7, &[0, 2, 3, 6]);
        for (k, expected) in [(0, 0), (1, 2), (2, 3), (3, 6)] {
            assert_eq!(map.logical_index(k).unwrap(), expected);
            assert_eq!(map.non_null_index(expected), k);
        }
        assert!(map.logical_index(4).is_err());
    }

    #[test]
    fn rank_cache_spans_word_boundaries() {
        let present: Vec<usize> = (0..300).filter(|i| i % 3 == 0).collect();
        let map = map_of(300, &present);
        assert_eq!(map.present_count(), present.len());
        for (k, &logical) in present.iter().enumerate() {
            assert_eq!(map.non_null_index(logical), k);
            assert_eq!(map.logical_index(k).unwrap(), logical);
        }
    }

    #[test]
    fn byte_round_trip_preserves_bits() {
        let map = map_of(77, &[0, 1, 13, 63, 64, 76]);
        let restored = PresenceMap::from_bytes(&map.to_bytes(), 77).unwrap();
        assert_eq!(map, restored);
        assert_eq!(restored.present_count(), 6);
    }

    #[test]
    fn boundary_scans_find_first_and_last() {
        let map = map_of(6, &[2, 4]);
        assert_eq!(map.first_present(), Some(2));
        assert_eq!(map.last_present(), Some(4));
        assert_eq!(map.first_absent(), Some(0));
        assert_eq!(map.last_absent(), Some(5));
    }

    #[test]
    fn sub_and_concat_rebuild_rank() {
        let map = map_of(10, &[1, 4, 7, 9]);
        let left = map.sub(0, 5);
        let right = map.sub(5, 10);
        assert_eq!(left.present_count(), 2);
        assert_eq!(right.present_count(), 2);
        assert_eq!(left.concat(&right), map);
    }
}
