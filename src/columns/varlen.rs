//! # Variable-Length Columns
//!
//! Text and blob columns store two blocks: a contiguous element-bytes block
//! and a `u32` pointer array marking where each element starts
//! (`pointers[0] == 0`; an element ends where the next one starts, or at
//! the end of the byte block).
//!
//! ```text
//! pointers:  | 0 | 3 | 3 | 8 |
//! data:      | f o o | 	   | h e l l o | ...
//!              elem0   elem1   elem2       elem3 -> runs to block end
//! ```
//!
//! A view shares both blocks and windows the pointer array only; element
//! bounds keep working because the pointers past the window still exist in
//! the shared block. Text elements are UTF-8 and validated on read; blob
//! elements are raw bytes. Ordering is lexicographic over element bytes,
//! which for UTF-8 text equals code-point order.

use crate::columns::search::{
    binary_search, linear_search, widen_to_first, widen_to_last, SearchOutcome,
};
use crate::columns::Characteristics;
use crate::memory::ByteBlock;
use crate::types::ScalarType;
use bitvec::prelude::*;
use eyre::{bail, ensure, Result};
use std::cmp::Ordering;

#[derive(Clone)]
pub struct VarLenColumn {
    ty: ScalarType,
    data: ByteBlock,
    pointers: ByteBlock,
    /// Element offset of this view into the pointer array.
    first: usize,
    len: usize,
    /// Entries in the shared pointer array.
    total: usize,
    chars: Characteristics,
}

impl VarLenColumn {
    /// Freezes element slices into a column, verifying any order claim.
    pub fn from_slices(items: &[&[u8]], ty: ScalarType, chars: Characteristics) -> Result<Self> {
        ensure!(ty.is_variable(), "{ty} is not a variable-length kind");
        ensure!(
            chars.is_nonnull(),
            "variable-length columns are non-null; wrap in a nullable column for gaps"
        );
        let total_bytes: usize = items.iter().map(|s| s.len()).sum();
        let mut data = Vec::with_capacity(total_bytes);
        let mut pointers = Vec::with_capacity(items.len() * 4);
        for item in items {
            pointers.extend_from_slice(&(data.len() as u32).to_le_bytes());
            data.extend_from_slice(item);
        }
        let column = Self {
            ty,
            data: ByteBlock::from_vec(data),
            pointers: ByteBlock::from_vec(pointers),
            first: 0,
            len: items.len(),
            total: items.len(),
            chars,
        };
        column.verify_claims()?;
        Ok(column)
    }

    pub fn from_strs(items: &[&str], chars: Characteristics) -> Result<Self> {
        let bytes: Vec<&[u8]> = items.iter().map(|s| s.as_bytes()).collect();
        Self::from_slices(&bytes, ScalarType::Text, chars)
    }

    /// Wraps blocks assembled by a builder or read off the wire, verifying
    /// the pointer array shape and any order claim.
    pub(crate) fn from_parts(
        data: ByteBlock,
        pointers: ByteBlock,
        len: usize,
        ty: ScalarType,
        chars: Characteristics,
    ) -> Result<Self> {
        ensure!(ty.is_variable(), "{ty} is not a variable-length kind");
        ensure!(
            pointers.len() == len * 4,
            "pointer block of {} bytes does not hold {} entries",
            pointers.len(),
            len
        );
        let column = Self {
            ty,
            data,
            pointers,
            first: 0,
            len,
            total: len,
            chars,
        };
        if len > 0 {
            ensure!(column.ptr(0) == 0, "malformed pointer array: first entry is not zero");
            for k in 1..len {
                ensure!(
                    column.ptr(k - 1) <= column.ptr(k) && column.ptr(k) <= column.data.len(),
                    "malformed pointer array at entry {k}"
                );
            }
        }
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
    pub fn scalar_type(&self) -> ScalarType {
        self.ty
    }

    #[inline]
    pub fn characteristics(&self) -> Characteristics {
        self.chars
    }

    /// Absolute byte offset where element `k` of the shared array starts.
    #[inline]
    fn ptr(&self, k: usize) -> usize {
        if k == self.total {
            return self.data.len();
        }
        let bytes = self.pointers.as_slice();
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[k * 4..k * 4 + 4]);
        u32::from_le_bytes(buf) as usize
    }

    #[inline]
    fn bounds(&self, index: usize) -> (usize, usize) {
        (self.ptr(self.first + index), self.ptr(self.first + index + 1))
    }

    /// Element bytes at `index`, without the public bounds check.
    #[inline]
    pub(crate) fn bytes_at(&self, index: usize) -> &[u8] {
        let (start, end) = self.bounds(index);
        &self.data.as_slice()[start..end]
    }

    pub fn get_bytes(&self, index: usize) -> Result<&[u8]> {
        ensure!(
            index < self.len,
            "index {} out of range for column of {} elements",
            index,
            self.len
        );
        Ok(self.bytes_at(index))
    }

    /// Element text at `index`. Fails on a blob column and on invalid UTF-8.
    pub fn get_str(&self, index: usize) -> Result<&str> {
        ensure!(
            self.ty == ScalarType::Text,
            "column of type {} has no text accessor",
            self.ty
        );
        let bytes = self.get_bytes(index)?;
        std::str::from_utf8(bytes)
            .map_err(|e| eyre::eyre!("invalid UTF-8 at index {index}: {e}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len).map(|i| self.bytes_at(i))
    }

    pub fn first(&self) -> Option<&[u8]> {
        (self.len > 0).then(|| self.bytes_at(0))
    }

    pub fn last(&self) -> Option<&[u8]> {
        (self.len > 0).then(|| self.bytes_at(self.len - 1))
    }

    /// Total element bytes covered by this view.
    pub(crate) fn byte_len(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        self.ptr(self.first + self.len) - self.ptr(self.first)
    }

    /// Pointer of element `index` renormalized so the view starts at zero,
    /// for serialization.
    pub(crate) fn pointer_at(&self, index: usize) -> u32 {
        (self.ptr(self.first + index) - self.ptr(self.first)) as u32
    }

    /// The element bytes covered by this view, contiguous.
    pub(crate) fn data_window(&self) -> &[u8] {
        let start = self.ptr(self.first);
        &self.data.as_slice()[start..start + self.byte_len()]
    }

    /// O(1) shared-block view over `from..to`.
    pub fn sub_column(&self, from: usize, to: usize) -> Result<Self> {
        ensure!(
            from <= to && to <= self.len,
            "sub-column range {from}..{to} out of range for column of {} elements",
            self.len
        );
        Ok(Self {
            ty: self.ty,
            data: self.data.clone(),
            pointers: self.pointers.clone(),
            first: self.first + from,
            len: to - from,
            total: self.total,
            chars: self.chars,
        })
    }

    /// Deep copy with renormalized pointers and a minimal byte block.
    pub fn copy(&self) -> Self {
        let base = self.ptr(self.first);
        let mut pointers = Vec::with_capacity(self.len * 4);
        for i in 0..self.len {
            pointers.extend_from_slice(&((self.ptr(self.first + i) - base) as u32).to_le_bytes());
        }
        Self {
            ty: self.ty,
            data: ByteBlock::from_vec(self.data_window().to_vec()),
            pointers: ByteBlock::from_vec(pointers),
            first: 0,
            len: self.len,
            total: self.len,
            chars: self.chars,
        }
    }

    pub(crate) fn is_sorted_run(&self) -> bool {
        (1..self.len).all(|i| self.bytes_at(i - 1) <= self.bytes_at(i))
    }

    fn is_strictly_increasing(&self) -> bool {
        (1..self.len).all(|i| self.bytes_at(i - 1) < self.bytes_at(i))
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

    fn repack(&self, items: &[&[u8]], chars: Characteristics) -> Self {
        let total_bytes: usize = items.iter().map(|s| s.len()).sum();
        let mut data = Vec::with_capacity(total_bytes);
        let mut pointers = Vec::with_capacity(items.len() * 4);
        for item in items {
            pointers.extend_from_slice(&(data.len() as u32).to_le_bytes());
            data.extend_from_slice(item);
        }
        Self {
            ty: self.ty,
            data: ByteBlock::from_vec(data),
            pointers: ByteBlock::from_vec(pointers),
            first: 0,
            len: items.len(),
            total: items.len(),
            chars,
        }
    }

    pub fn to_heap(&self) -> Self {
        let mut heap = self.clone();
        heap.chars = self.chars.strip_order();
        heap
    }

    pub fn to_sorted(&self) -> Self {
        if self.chars.is_sorted() {
            return self.clone();
        }
        if self.is_sorted_run() {
            let mut sorted = self.clone();
            sorted.chars = Characteristics::SORTED;
            return sorted;
        }
        let mut items: Vec<&[u8]> = self.iter().collect();
        items.sort_unstable();
        self.repack(&items, Characteristics::SORTED)
    }

    pub fn to_distinct(&self) -> Self {
        if self.chars.is_distinct() {
            return self.clone();
        }
        if self.is_strictly_increasing() {
            let mut distinct = self.clone();
            distinct.chars = Characteristics::DISTINCT;
            return distinct;
        }
        let mut items: Vec<&[u8]> = self.iter().collect();
        if !self.chars.is_sorted() && !self.is_sorted_run() {
            items.sort_unstable();
        }
        items.dedup();
        self.repack(&items, Characteristics::DISTINCT)
    }

    pub fn search(&self, target: &[u8], find_first: bool) -> SearchOutcome {
        if self.chars.is_sorted() {
            match binary_search(self.len, |i| self.bytes_at(i).cmp(target)) {
                SearchOutcome::Found(hit) if !self.chars.is_distinct() => {
                    let eq = |i: usize| self.bytes_at(i) == target;
                    if find_first {
                        SearchOutcome::Found(widen_to_first(hit, eq))
                    } else {
                        SearchOutcome::Found(widen_to_last(hit, self.len, eq))
                    }
                }
                outcome => outcome,
            }
        } else {
            linear_search(self.len, find_first, |i| self.bytes_at(i) == target)
        }
    }

    pub fn index_of(&self, target: &[u8]) -> Option<usize> {
        self.search(target, true).found()
    }

    pub fn last_index_of(&self, target: &[u8]) -> Option<usize> {
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

    pub fn floor(&self, target: &[u8]) -> Result<Option<&[u8]>> {
        self.require_distinct("floor")?;
        Ok(match self.search(target, true) {
            SearchOutcome::Found(i) => Some(self.bytes_at(i)),
            SearchOutcome::Insertion(i) if i > 0 => Some(self.bytes_at(i - 1)),
            SearchOutcome::Insertion(_) => None,
        })
    }

    pub fn ceiling(&self, target: &[u8]) -> Result<Option<&[u8]>> {
        self.require_distinct("ceiling")?;
        Ok(match self.search(target, true) {
            SearchOutcome::Found(i) => Some(self.bytes_at(i)),
            SearchOutcome::Insertion(i) if i < self.len => Some(self.bytes_at(i)),
            SearchOutcome::Insertion(_) => None,
        })
    }

    pub fn lower(&self, target: &[u8]) -> Result<Option<&[u8]>> {
        self.require_distinct("lower")?;
        let boundary = self.search(target, true).index();
        Ok((boundary > 0).then(|| self.bytes_at(boundary - 1)))
    }

    pub fn higher(&self, target: &[u8]) -> Result<Option<&[u8]>> {
        self.require_distinct("higher")?;
        Ok(match self.search(target, true) {
            SearchOutcome::Found(i) if i + 1 < self.len => Some(self.bytes_at(i + 1)),
            SearchOutcome::Found(_) => None,
            SearchOutcome::Insertion(i) if i < self.len => Some(self.bytes_at(i)),
            SearchOutcome::Insertion(_) => None,
        })
    }

    pub fn sub_column_by_value(&self, from: &[u8], to: &[u8]) -> Result<Self> {
        self.require_sorted("sub_column_by_value")?;
        ensure!(from <= to, "malformed value range: from exceeds to");
        let lo = self.search(from, true).index();
        let hi = match self.search(to, false) {
            SearchOutcome::Found(i) => i + 1,
            SearchOutcome::Insertion(i) => i,
        };
        self.sub_column(lo, hi.max(lo))
    }

    pub fn head(&self, bound: &[u8]) -> Result<Self> {
        self.require_sorted("head")?;
        let cut = self.search(bound, true).index();
        self.sub_column(0, cut)
    }

    pub fn tail(&self, bound: &[u8]) -> Result<Self> {
        self.require_sorted("tail")?;
        let cut = self.search(bound, true).index();
        self.sub_column(cut, self.len)
    }

    /// Two-pass kept-bytes copy: size the byte block first, then rebuild
    /// pointers while copying.
    pub(crate) fn filter_kept(&self, keep: &BitSlice<u64, Lsb0>) -> Self {
        let kept_bytes: usize = keep.iter_ones().map(|i| self.bytes_at(i).len()).sum();
        let mut data = Vec::with_capacity(kept_bytes);
        let mut pointers = Vec::with_capacity(keep.count_ones() * 4);
        for i in keep.iter_ones() {
            pointers.extend_from_slice(&(data.len() as u32).to_le_bytes());
            data.extend_from_slice(self.bytes_at(i));
        }
        let len = pointers.len() / 4;
        Self {
            ty: self.ty,
            data: ByteBlock::from_vec(data),
            pointers: ByteBlock::from_vec(pointers),
            first: 0,
            len,
            total: len,
            chars: self.chars,
        }
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        for &i in indices {
            ensure!(
                i < self.len,
                "select index {} out of range for column of {} elements",
                i,
                self.len
            );
        }
        let items: Vec<&[u8]> = indices.iter().map(|&i| self.bytes_at(i)).collect();
        Ok(self.repack(&items, Characteristics::NONNULL))
    }

    pub fn append(&self, other: &Self) -> Result<Self> {
        if self.ty != other.ty {
            bail!("cannot append {} column to {} column", other.ty, self.ty);
        }
        ensure!(
            self.chars == other.chars,
            "mismatched characteristics on append: {:?} vs {:?}",
            self.chars,
            other.chars
        );
        if let (Some(last), Some(first)) = (self.last(), other.first()) {
            if self.chars.is_distinct() {
                ensure!(
                    last < first,
                    "append would break the DISTINCT claim: tail does not start above this column"
                );
            } else if self.chars.is_sorted() {
                ensure!(
                    last <= first,
                    "append would break the SORTED claim: tail starts below this column"
                );
            }
        }
        let mut data = Vec::with_capacity(self.byte_len() + other.byte_len());
        let mut pointers = Vec::with_capacity((self.len + other.len) * 4);
        for item in self.iter().chain(other.iter()) {
            pointers.extend_from_slice(&(data.len() as u32).to_le_bytes());
            data.extend_from_slice(item);
        }
        Ok(Self {
            ty: self.ty,
            data: ByteBlock::from_vec(data),
            pointers: ByteBlock::from_vec(pointers),
            first: 0,
            len: self.len + other.len,
            total: self.len + other.len,
            chars: self.chars,
        })
    }

    /// Positional comparison hook for the join layer.
    #[inline]
    pub(crate) fn cmp_at(&self, i: usize, other: &Self, j: usize) -> Ordering {
        self.bytes_at(i).cmp(other.bytes_at(j))
    }
}

impl PartialEq for VarLenColumn {
    /// Content equality; characteristics are not part of it.
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.len == other.len && self.iter().eq(other.iter())
    }
}

impl std::fmt::Debug for VarLenColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarLenColumn")
            .field("ty", &self.ty)
            .field("len", &self.len)
            .field("bytes", &self.byte_len())
            .finish()
    }
}
