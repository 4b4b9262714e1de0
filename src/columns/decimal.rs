//! # Decimal Columns
//!
//! Decimals are stored as 128-bit unscaled digits with a single scale
//! declared per column: the value at a slot is `digits * 10^-scale`. With a
//! shared scale, digit order equals numeric order, so every ordering
//! algorithm delegates to the underlying [`FixedColumn<i128>`] untouched.
//! Operations combining two decimal columns require matching scales.

use crate::columns::search::SearchOutcome;
use crate::columns::{Characteristics, FixedColumn};
use crate::memory::ByteBlock;
use bitvec::prelude::*;
use eyre::{ensure, Result};

#[derive(Clone, Debug)]
pub struct DecimalColumn {
    digits: FixedColumn<i128>,
    scale: u8,
}

impl DecimalColumn {
    pub fn from_digits(digits: &[i128], scale: u8, chars: Characteristics) -> Result<Self> {
        Ok(Self {
            digits: FixedColumn::from_values(digits, chars)?,
            scale,
        })
    }

    pub(crate) fn from_parts(
        block: ByteBlock,
        len: usize,
        scale: u8,
        chars: Characteristics,
    ) -> Result<Self> {
        Ok(Self {
            digits: FixedColumn::from_parts(block, len, chars)?,
            scale,
        })
    }

    pub(crate) fn from_inner(digits: FixedColumn<i128>, scale: u8) -> Self {
        Self { digits, scale }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    #[inline]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    #[inline]
    pub fn characteristics(&self) -> Characteristics {
        self.digits.characteristics()
    }

    /// The underlying digit column.
    pub(crate) fn inner(&self) -> &FixedColumn<i128> {
        &self.digits
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.digits.as_bytes()
    }

    /// Unscaled digits at `index`.
    pub fn get(&self, index: usize) -> Result<i128> {
        self.digits.get(index)
    }

    pub fn first(&self) -> Option<i128> {
        self.digits.first()
    }

    pub fn last(&self) -> Option<i128> {
        self.digits.last()
    }

    pub fn sub_column(&self, from: usize, to: usize) -> Result<Self> {
        Ok(Self::from_inner(self.digits.sub_column(from, to)?, self.scale))
    }

    pub fn copy(&self) -> Self {
        Self::from_inner(self.digits.copy(), self.scale)
    }

    pub fn to_heap(&self) -> Self {
        Self::from_inner(self.digits.to_heap(), self.scale)
    }

    pub fn to_sorted(&self) -> Self {
        Self::from_inner(self.digits.to_sorted(), self.scale)
    }

    pub fn to_distinct(&self) -> Self {
        Self::from_inner(self.digits.to_distinct(), self.scale)
    }

    fn check_scale(&self, other: &Self, op: &str) -> Result<()> {
        ensure!(
            self.scale == other.scale,
            "mismatched decimal scales on {op}: {} vs {}",
            self.scale,
            other.scale
        );
        Ok(())
    }

    /// Checks that a caller-supplied value carries this column's scale.
    pub(crate) fn check_value_scale(&self, scale: u8) -> Result<()> {
        ensure!(
            self.scale == scale,
            "mismatched decimal scales: column holds {}, value carries {}",
            self.scale,
            scale
        );
        Ok(())
    }

    pub fn search(&self, digits: i128, find_first: bool) -> SearchOutcome {
        self.digits.search(digits, find_first)
    }

    pub fn index_of(&self, digits: i128) -> Option<usize> {
        self.digits.index_of(digits)
    }

    pub fn last_index_of(&self, digits: i128) -> Option<usize> {
        self.digits.last_index_of(digits)
    }

    pub fn floor(&self, digits: i128) -> Result<Option<i128>> {
        self.digits.floor(digits)
    }

    pub fn ceiling(&self, digits: i128) -> Result<Option<i128>> {
        self.digits.ceiling(digits)
    }

    pub fn lower(&self, digits: i128) -> Result<Option<i128>> {
        self.digits.lower(digits)
    }

    pub fn higher(&self, digits: i128) -> Result<Option<i128>> {
        self.digits.higher(digits)
    }

    pub fn sub_column_by_value(&self, from: i128, to: i128) -> Result<Self> {
        Ok(Self::from_inner(
            self.digits.sub_column_by_value(from, to)?,
            self.scale,
        ))
    }

    pub fn head(&self, bound: i128) -> Result<Self> {
        Ok(Self::from_inner(self.digits.head(bound)?, self.scale))
    }

    pub fn tail(&self, bound: i128) -> Result<Self> {
        Ok(Self::from_inner(self.digits.tail(bound)?, self.scale))
    }

    pub(crate) fn filter_kept(&self, keep: &BitSlice<u64, Lsb0>) -> Self {
        Self::from_inner(self.digits.filter_kept(keep), self.scale)
    }

    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        Ok(Self::from_inner(self.digits.select(indices)?, self.scale))
    }

    pub fn append(&self, other: &Self) -> Result<Self> {
        self.check_scale(other, "append")?;
        Ok(Self::from_inner(self.digits.append(&other.digits)?, self.scale))
    }

    #[inline]
    pub(crate) fn cmp_at(&self, i: usize, other: &Self, j: usize) -> std::cmp::Ordering {
        self.digits.cmp_at(i, other.inner(), j)
    }

    pub(crate) fn is_sorted_run(&self) -> bool {
        self.digits.is_sorted_run()
    }
}

impl PartialEq for DecimalColumn {
    fn eq(&self, other: &Self) -> bool {
        self.scale == other.scale && self.digits == other.digits
    }
}
