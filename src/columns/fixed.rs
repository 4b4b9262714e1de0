//! # Fixed-Width Columns
//!
//! [`FixedColumn<T>`] stores one element per fixed-stride slot in a shared
//! [`ByteBlock`], little-endian. The element types are:
//!
//! | Element | Width | Kinds served |
//! |---------|-------|--------------|
//! | `i8` / `i16` / `i32` / `i64` | 1 / 2 / 4 / 8 | integers, date (days), time and timestamp (micros) |
//! | `f32` / `f64` | 4 / 8 | floats, IEEE total order |
//! | `i128` | 16 | decimal unscaled digits |
//! | `[u8; 16]` | 16 | UUIDs, lexicographic order |
//!
//! Every view operation (`sub_column`) is O(1) and shares the block; `copy`
//! deep-copies exactly the viewed bytes. Search, sort, and dedup live here
//! and are reused verbatim by the temporal, decimal, and UUID kinds.

use crate::columns::search::{
    binary_search, linear_search, widen_to_first, widen_to_last, SearchOutcome,
};
use crate::columns::Characteristics;
use crate::memory::ByteBlock;
use bitvec::prelude::*;
use eyre::{ensure, Result};
use std::cmp::Ordering;
use std::marker::PhantomData;

/// A fixed-width element: raw little-endian codec plus a total order.
pub trait FixedElem: Copy + PartialEq + Send + Sync + 'static {
    /// Slot width in bytes.
    const WIDTH: usize;

    /// Decodes one element from the first `WIDTH` bytes.
    fn decode(bytes: &[u8]) -> Self;

    /// Encodes one element into the first `WIDTH` bytes.
    fn encode(&self, out: &mut [u8]);

    /// Total order over elements. For floats this is IEEE `total_cmp`.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

crate::impl_fixed_elem! {
    i8 => 1,
    i16 => 2,
    i32 => 4,
    i64 => 8,
    i128 => 16,
}

impl FixedElem for f32 {
    const WIDTH: usize = 4;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[..4]);
        f32::from_le_bytes(buf)
    }

    #[inline]
    fn encode(&self, out: &mut [u8]) {
        out[..4].copy_from_slice(&self.to_le_bytes());
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl FixedElem for f64 {
    const WIDTH: usize = 8;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(buf)
    }

    #[inline]
    fn encode(&self, out: &mut [u8]) {
        out[..8].copy_from_slice(&self.to_le_bytes());
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

impl FixedElem for [u8; 16] {
    const WIDTH: usize = 16;

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes[..16]);
        buf
    }

    #[inline]
    fn encode(&self, out: &mut [u8]) {
        out[..16].copy_from_slice(self);
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

/// An immutable fixed-width column: a stride-`T::WIDTH` window over a shared
/// byte block plus declared characteristics.
#[derive(Clone)]
pub struct FixedColumn<T: FixedElem> {
    block: ByteBlock,
    len: usize,
    chars: Characteristics,
    _elem: PhantomData<T>,
}

impl<T: FixedElem> FixedColumn<T> {
    /// Freezes `values` into a column, verifying any order claim.
    pub fn from_values(values: &[T], chars: Characteristics) -> Result<Self> {
        ensure!(
            chars.is_nonnull(),
            "fixed-width columns are non-null; wrap in a nullable column for gaps"
        );
        let mut bytes = vec![0u8; values.len() * T::WIDTH];
        for (i, v) in values.iter().enumerate() {
            v.encode(&mut bytes[i * T::WIDTH..]);
        }
        let column = Self {
            block: ByteBlock::from_vec(bytes),
            len: values.len(),
            chars,
            _elem: PhantomData,
        };
        column.verify_claims()?;
        Ok(column)
    }

    /// Wraps an existing block, verifying any order claim against the
    /// bytes. Builders and deserialization funnel through here.
    pub(crate) fn from_parts(block: ByteBlock, len: usize, chars: Characteristics) -> Result<Self> {
        ensure!(
            block.len() == len * T::WIDTH,
            "block of {} bytes does not hold {} elements of width {}",
            block.len(),
            len,
            T::WIDTH
        );
        ensure!(chars.is_nonnull(), "fixed-width columns are non-null");
        let column = Self {
            block,
            len,
            chars,
            _elem: PhantomData,
        };
        column.verify_claims()?;
        Ok(column)
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
    pub fn characteristics(&self) -> Characteristics {
        self.chars
    }

    /// Raw little-endian element bytes of this view.
    pub fn as_bytes(&self) -> &[u8] {
        self.block.as_slice()
    }

    /// Element at `index`, without bounds checking the public way.
    #[inline]
    pub(crate) fn elem(&self, index: usize) -> T {
        T::decode(&self.block.as_slice()[index * T::WIDTH..])
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        ensure!(
            index < self.len,
            "index {} out of range for column of {} elements",
            index,
            self.len
        );
        Ok(self.elem(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(|i| self.elem(i))
    }

    pub fn first(&self) -> Option<T> {
        (self.len > 0).then(|| self.elem(0))
    }

    pub fn last(&self) -> Option<T> {
        (self.len > 0).then(|| self.elem(self.len - 1))
    }

    /// O(1) shared-block view over `from..to`.
    pub fn sub_column(&self, from: usize, to: usize) -> Result<Self> {
        ensure!(
            from <= to && to <= self.len,
            "sub-column range {from}..{to} out of range for column of {} elements",
            self.len
        );
        Ok(Self {
            block: self.block.view(from * T::WIDTH, (to - from) * T::WIDTH)?,
            len: to - from,
            chars: self.chars,
            _elem: PhantomData,
        })
    }

    /// Deep copy sized to this view.
    pub fn copy(&self) -> Self {
        Self {
            block: self.block.to_compact(),
            len: self.len,
            chars: self.chars,
            _elem: PhantomData,
        }
    }

    fn decode_all(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Whether the stored bytes are non-decreasing.
    pub(crate) fn is_sorted_run(&self) -> bool {
        (1..self.len).all(|i| self.elem(i - 1).total_cmp(&self.elem(i)) != Ordering::Greater)
    }

    /// Whether the stored bytes are strictly increasing.
    fn is_strictly_increasing(&self) -> bool {
        (1..self.len).all(|i| self.elem(i - 1).total_cmp(&self.elem(i)) == Ordering::Less)
    }

    fn verify_claims(&self) -> Result<()> {
        if self.chars.is_distinct() {
            ensure!(
                self.is_strictly_increasing(),
                "values do not satisfy the DISTINCT claim"
            );
        } else if self.chars.is_sorted() {
            ensure!(self.is_sorted_run(), "values do not satisfy the SORTED claim");
        }
        Ok(())
    }

    /// Strips order claims without copying.
    pub fn to_heap(&self) -> Self {
        let mut heap = self.clone();
        heap.chars = self.chars.strip_order();
        heap
    }

    /// Produces a SORTED column: relabels when the bytes are already
    /// ordered, otherwise copies and sorts.
    pub fn to_sorted(&self) -> Self {
        if self.chars.is_sorted() {
            return self.clone();
        }
        if self.is_sorted_run() {
            let mut sorted = self.clone();
            sorted.chars = Characteristics::SORTED;
            return sorted;
        }
        let mut values = self.decode_all();
        values.sort_unstable_by(T::total_cmp);
        Self::repack(&values, Characteristics::SORTED)
    }

    /// Produces a DISTINCT column: relabels when already strictly
    /// increasing, deduplicates an already-sorted run, otherwise copies,
    /// sorts, and deduplicates.
    pub fn to_distinct(&self) -> Self {
        if self.chars.is_distinct() {
            return self.clone();
        }
        if self.is_strictly_increasing() {
            let mut distinct = self.clone();
            distinct.chars = Characteristics::DISTINCT;
            return distinct;
        }
        if self.chars.is_sorted() || self.is_sorted_run() {
            return Self::repack(&Self::dedup_sorted(self.iter()), Characteristics::DISTINCT);
        }
        let mut values = self.decode_all();
        values.sort_unstable_by(T::total_cmp);
        Self::repack(
            &Self::dedup_sorted(values.into_iter()),
            Characteristics::DISTINCT,
        )
    }

    /// One forward pass over a sorted run, keeping the first of each equal
    /// run.
    fn dedup_sorted(values: impl Iterator<Item = T>) -> Vec<T> {
        let mut kept: Vec<T> = Vec::new();
        for v in values {
            match kept.last() {
                Some(last) if last.total_cmp(&v) == Ordering::Equal => {}
                _ => kept.push(v),
            }
        }
        kept
    }

    /// Packs `values` into a fresh column whose bytes are known to satisfy
    /// `chars`.
    fn repack(values: &[T], chars: Characteristics) -> Self {
        let mut bytes = vec![0u8; values.len() * T::WIDTH];
        for (i, v) in values.iter().enumerate() {
            v.encode(&mut bytes[i * T::WIDTH..]);
        }
        Self {
            block: ByteBlock::from_vec(bytes),
            len: values.len(),
            chars,
            _elem: PhantomData,
        }
    }

    /// Searches for `target`. Binary search under an order claim (with
    /// equal-run widening when not DISTINCT), directional linear scan
    /// otherwise.
    pub fn search(&self, target: T, find_first: bool) -> SearchOutcome {
        if self.chars.is_sorted() {
            match binary_search(self.len, |i| self.elem(i).total_cmp(&target)) {
                SearchOutcome::Found(hit) if !self.chars.is_distinct() => {
                    let eq = |i: usize| self.elem(i).total_cmp(&target) == Ordering::Equal;
                    if find_first {
                        SearchOutcome::Found(widen_to_first(hit, eq))
                    } else {
                        SearchOutcome::Found(widen_to_last(hit, self.len, eq))
                    }
                }
                outcome => outcome,
            }
        } else {
            linear_search(self.len, find_first, |i| {
                self.elem(i).total_cmp(&target) == Ordering::Equal
            })
        }
    }

    pub fn index_of(&self, target: T) -> Option<usize> {
        self.search(target, true).found()
    }

    pub fn last_index_of(&self, target: T) -> Option<usize> {
        self.search(target, false).found()
    }

    fn require_distinct(&self, op: &str) -> Result<()> {
        ensure!(
            self.chars.is_distinct(),
            "{op} requires a distinct column, got {:?}",
            self.chars
        );
        Ok(())
    }

    fn require_sorted(&self, op: &str) -> Result<()> {
        ensure!(
            self.chars.is_sorted(),
            "{op} requires a sorted column, got {:?}",
            self.chars
        );
        Ok(())
    }

    /// Greatest element at or below `target`. Requires DISTINCT.
    pub fn floor(&self, target: T) -> Result<Option<T>> {
        self.require_distinct("floor")?;
        Ok(match self.search(target, true) {
            SearchOutcome::Found(_) => Some(target),
            SearchOutcome::Insertion(i) if i > 0 => Some(self.elem(i - 1)),
            SearchOutcome::Insertion(_) => None,
        })
    }

    /// Least element at or above `target`. Requires DISTINCT.
    pub fn ceiling(&self, target: T) -> Result<Option<T>> {
        self.require_distinct("ceiling")?;
        Ok(match self.search(target, true) {
            SearchOutcome::Found(_) => Some(target),
            SearchOutcome::Insertion(i) if i < self.len => Some(self.elem(i)),
            SearchOutcome::Insertion(_) => None,
        })
    }

    /// Greatest element strictly below `target`. Requires DISTINCT.
    pub fn lower(&self, target: T) -> Result<Option<T>> {
        self.require_distinct("lower")?;
        let boundary = self.search(target, true).index();
        Ok((boundary > 0).then(|| self.elem(boundary - 1)))
    }

    /// Least element strictly above `target`. Requires DISTINCT.
    pub fn higher(&self, target: T) -> Result<Option<T>> {
        self.require_distinct("higher")?;
        Ok(match self.search(target, true) {
            SearchOutcome::Found(i) if i + 1 < self.len => Some(self.elem(i + 1)),
            SearchOutcome::Found(_) => None,
            SearchOutcome::Insertion(i) if i < self.len => Some(self.elem(i)),
            SearchOutcome::Insertion(_) => None,
        })
    }

    /// View of the inclusive value range `from..=to`. Requires SORTED.
    pub fn sub_column_by_value(&self, from: T, to: T) -> Result<Self> {
        self.require_sorted("sub_column_by_value")?;
        ensure!(
            from.total_cmp(&to) != Ordering::Greater,
            "malformed value range: from exceeds to"
        );
        let lo = self.search(from, true).index();
        let hi = match self.search(to, false) {
            SearchOutcome::Found(i) => i + 1,
            SearchOutcome::Insertion(i) => i,
        };
        self.sub_column(lo, hi.max(lo))
    }

    /// View of every element strictly below `bound`. Requires SORTED.
    pub fn head(&self, bound: T) -> Result<Self> {
        self.require_sorted("head")?;
        let cut = self.search(bound, true).index();
        self.sub_column(0, cut)
    }

    /// View of every element at or above `bound`. Requires SORTED.
    pub fn tail(&self, bound: T) -> Result<Self> {
        self.require_sorted("tail")?;
        let cut = self.search(bound, true).index();
        self.sub_column(cut, self.len)
    }

    /// Copies the kept elements, in order. Degenerate cardinalities are
    /// handled by the set-algebra layer before this is reached.
    pub(crate) fn filter_kept(&self, keep: &BitSlice<u64, Lsb0>) -> Self {
        let mut bytes = Vec::with_capacity(keep.count_ones() * T::WIDTH);
        let src = self.block.as_slice();
        for i in keep.iter_ones() {
            bytes.extend_from_slice(&src[i * T::WIDTH..(i + 1) * T::WIDTH]);
        }
        let len = bytes.len() / T::WIDTH;
        Self {
            block: ByteBlock::from_vec(bytes),
            len,
            chars: self.chars,
            _elem: PhantomData,
        }
    }

    /// Gathers elements by index. No order is assumed or preserved: the
    /// output carries the non-null claim only.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut bytes = Vec::with_capacity(indices.len() * T::WIDTH);
        let src = self.block.as_slice();
        for &i in indices {
            ensure!(
                i < self.len,
                "select index {} out of range for column of {} elements",
                i,
                self.len
            );
            bytes.extend_from_slice(&src[i * T::WIDTH..(i + 1) * T::WIDTH]);
        }
        Ok(Self {
            block: ByteBlock::from_vec(bytes),
            len: indices.len(),
            chars: Characteristics::NONNULL,
            _elem: PhantomData,
        })
    }

    /// Ordered concatenation. Characteristics must match; under DISTINCT the
    /// tail must start strictly above this column's last element, under
    /// SORTED at or above it.
    pub fn append(&self, other: &Self) -> Result<Self> {
        ensure!(
            self.chars == other.chars,
            "mismatched characteristics on append: {:?} vs {:?}",
            self.chars,
            other.chars
        );
        if let (Some(last), Some(first)) = (self.last(), other.first()) {
            if self.chars.is_distinct() {
                ensure!(
                    last.total_cmp(&first) == Ordering::Less,
                    "append would break the DISTINCT claim: tail does not start above this column"
                );
            } else if self.chars.is_sorted() {
                ensure!(
                    last.total_cmp(&first) != Ordering::Greater,
                    "append would break the SORTED claim: tail starts below this column"
                );
            }
        }
        let mut bytes = Vec::with_capacity((self.len + other.len) * T::WIDTH);
        bytes.extend_from_slice(self.block.as_slice());
        bytes.extend_from_slice(other.block.as_slice());
        Ok(Self {
            block: ByteBlock::from_vec(bytes),
            len: self.len + other.len,
            chars: self.chars,
            _elem: PhantomData,
        })
    }

    /// Positional comparison hook for the join layer.
    #[inline]
    pub(crate) fn cmp_at(&self, i: usize, other: &Self, j: usize) -> Ordering {
        self.elem(i).total_cmp(&other.elem(j))
    }
}

impl<T: FixedElem> PartialEq for FixedColumn<T> {
    /// Content equality; characteristics are not part of it.
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && (0..self.len).all(|i| self.elem(i).total_cmp(&other.elem(i)) == Ordering::Equal)
    }
}

impl<T: FixedElem> std::fmt::Debug for FixedColumn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedColumn")
            .field("len", &self.len)
            .field("width", &T::WIDTH)
            .field("chars", &self.chars)
            .finish()
    }
}
