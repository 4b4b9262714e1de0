//! # Boolean Columns
//!
//! Booleans pack eight elements per byte (LSB-first) into a shared
//! [`ByteBlock`]; a view is a bit offset plus a length, so `sub_column`
//! stays O(1) without byte alignment.
//!
//! Booleans opt out of ordering entirely: a two-valued kind cannot carry a
//! useful multi-valued order, so `to_sorted`, `to_distinct`, range
//! navigation, and the intersection primitives all raise one consistent
//! not-supported error instead of special-casing each call site.

use crate::columns::search::{linear_search, SearchOutcome};
use crate::columns::Characteristics;
use crate::memory::ByteBlock;
use bitvec::prelude::*;
use eyre::{ensure, Result};

#[derive(Clone)]
pub struct BoolColumn {
    block: ByteBlock,
    start_bit: usize,
    len: usize,
}

impl BoolColumn {
    pub fn from_bools(values: &[bool]) -> Self {
        let mut bytes = vec![0u8; values.len().div_ceil(8)];
        for (i, &v) in values.iter().enumerate() {
            if v {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len: values.len(),
        }
    }

    pub fn from_bitslice(bits: &BitSlice<u64, Lsb0>) -> Self {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for i in bits.iter_ones() {
            bytes[i / 8] |= 1 << (i % 8);
        }
        Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len: bits.len(),
        }
    }

    /// Wraps packed bytes read off the wire.
    pub(crate) fn from_packed_bytes(bytes: Vec<u8>, len: usize) -> Result<Self> {
        ensure!(
            bytes.len() == len.div_ceil(8),
            "packed boolean block of {} bytes does not hold {} elements",
            bytes.len(),
            len
        );
        Ok(Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Always plain NONNULL; booleans carry no order claims.
    #[inline]
    pub fn characteristics(&self) -> Characteristics {
        Characteristics::NONNULL
    }

    #[inline]
    pub(crate) fn bit(&self, index: usize) -> bool {
        let pos = self.start_bit + index;
        (self.block.as_slice()[pos / 8] >> (pos % 8)) & 1 == 1
    }

    pub fn get(&self, index: usize) -> Result<bool> {
        ensure!(
            index < self.len,
            "index {} out of range for column of {} elements",
            index,
            self.len
        );
        Ok(self.bit(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.bit(i))
    }

    pub fn first(&self) -> Option<bool> {
        (self.len > 0).then(|| self.bit(0))
    }

    pub fn last(&self) -> Option<bool> {
        (self.len > 0).then(|| self.bit(self.len - 1))
    }

    pub fn true_count(&self) -> usize {
        self.iter().filter(|&b| b).count()
    }

    pub fn sub_column(&self, from: usize, to: usize) -> Result<Self> {
        ensure!(
            from <= to && to <= self.len,
            "sub-column range {from}..{to} out of range for column of {} elements",
            self.len
        );
        Ok(Self {
            block: self.block.clone(),
            start_bit: self.start_bit + from,
            len: to - from,
        })
    }

    /// Repacks the viewed bits into a fresh bit-0-aligned block.
    pub fn copy(&self) -> Self {
        let mut bytes = vec![0u8; self.len.div_ceil(8)];
        for i in 0..self.len {
            if self.bit(i) {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len: self.len,
        }
    }

    /// Packed bytes of this view, bit-0 aligned, for serialization.
    pub(crate) fn packed_bytes(&self) -> Vec<u8> {
        if self.start_bit % 8 == 0 {
            let start = self.start_bit / 8;
            return self.block.as_slice()[start..start + self.len.div_ceil(8)].to_vec();
        }
        let mut bytes = vec![0u8; self.len.div_ceil(8)];
        for i in 0..self.len {
            if self.bit(i) {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        bytes
    }

    pub fn to_heap(&self) -> Self {
        self.clone()
    }

    pub fn search(&self, target: bool, find_first: bool) -> SearchOutcome {
        linear_search(self.len, find_first, |i| self.bit(i) == target)
    }

    pub fn index_of(&self, target: bool) -> Option<usize> {
        self.search(target, true).found()
    }

    pub fn last_index_of(&self, target: bool) -> Option<usize> {
        self.search(target, false).found()
    }

    /// The one error every ordering entry point funnels through.
    pub(crate) fn order_unsupported(op: &str) -> eyre::Report {
        eyre::eyre!("{op} is not supported for boolean columns")
    }

    pub(crate) fn filter_kept(&self, keep: &BitSlice<u64, Lsb0>) -> Self {
        let mut bytes = vec![0u8; keep.count_ones().div_ceil(8)];
        let mut out = 0usize;
        for i in keep.iter_ones() {
            if self.bit(i) {
                bytes[out / 8] |= 1 << (out % 8);
            }
            out += 1;
        }
        Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len: out,
        }
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut bytes = vec![0u8; indices.len().div_ceil(8)];
        for (out, &i) in indices.iter().enumerate() {
            ensure!(
                i < self.len,
                "select index {} out of range for column of {} elements",
                i,
                self.len
            );
            if self.bit(i) {
                bytes[out / 8] |= 1 << (out % 8);
            }
        }
        Ok(Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len: indices.len(),
        })
    }

    /// Concatenation. Booleans carry no order claims, so there is no guard
    /// beyond the kinds matching (checked by the dispatch layer).
    pub fn append(&self, other: &Self) -> Result<Self> {
        let mut bytes = vec![0u8; (self.len + other.len).div_ceil(8)];
        for (out, v) in self.iter().chain(other.iter()).enumerate() {
            if v {
                bytes[out / 8] |= 1 << (out % 8);
            }
        }
        Ok(Self {
            block: ByteBlock::from_vec(bytes),
            start_bit: 0,
            len: self.len + other.len,
        })
    }
}

impl PartialEq for BoolColumn {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl std::fmt::Debug for BoolColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoolColumn")
            .field("len", &self.len)
            .field("start_bit", &self.start_bit)
            .finish()
    }
}
