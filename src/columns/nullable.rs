//! # Nullable Columns
//!
//! A nullable column composes a non-null inner column (holding only the
//! present values, packed contiguously) with a full-length
//! [`PresenceMap`]. The inner column doubles as the dense sub-column that
//! value search runs against; hits are mapped back to logical positions
//! through the presence map.
//!
//! ```text
//! logical:   | null |  5  | null |  7  |      presence: 0 1 0 1
//! dense:     |  5  |  7  |                    non_null_index(3) == 1
//! ```
//!
//! A nullable column can never be marked sorted or distinct: ordering and
//! uniqueness are defined only on the dense values, and callers needing
//! ordered access obtain it explicitly from the dense side. The inner
//! column is therefore stored with order claims stripped.

use crate::bitmap::PresenceMap;
use crate::columns::search::SearchOutcome;
use crate::columns::{Characteristics, Column};
use crate::types::Value;
use bitvec::prelude::*;
use eyre::{bail, ensure, Result};

#[derive(Clone, Debug)]
pub struct NullableColumn {
    values: Box<Column>,
    presence: PresenceMap,
}

impl NullableColumn {
    /// Composes a packed non-null column with its presence map.
    pub fn new(values: Column, presence: PresenceMap) -> Result<Self> {
        if matches!(values, Column::Nullable(_)) {
            bail!("nullable columns do not nest");
        }
        ensure!(
            values.len() == presence.present_count(),
            "inner column of {} values does not match {} present positions",
            values.len(),
            presence.present_count()
        );
        Ok(Self {
            values: Box::new(values.to_heap()),
            presence,
        })
    }

    /// Promotes a non-null column: every position present.
    pub fn from_column(column: &Column) -> Result<Self> {
        let len = column.len();
        Self::new(column.clone(), PresenceMap::from_bits(crate::bitmap::mask_ones(len)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.presence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.presence.absent_count()
    }

    /// Always [`Characteristics::NULLABLE`]; order claims live on the dense
    /// side only.
    #[inline]
    pub fn characteristics(&self) -> Characteristics {
        Characteristics::NULLABLE
    }

    pub fn scalar_type(&self) -> crate::types::ScalarType {
        self.values.scalar_type()
    }

    /// The dense sub-column: present values, packed.
    #[inline]
    pub fn dense(&self) -> &Column {
        &self.values
    }

    #[inline]
    pub fn presence(&self) -> &PresenceMap {
        &self.presence
    }

    fn check_index(&self, index: usize) -> Result<()> {
        ensure!(
            index < self.len(),
            "index {} out of range for column of {} elements",
            index,
            self.len()
        );
        Ok(())
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(!self.presence.is_present(index))
    }

    /// Physical position of `logical` within the dense sub-column. Defined
    /// for absent positions too, where it names the slot the value would
    /// occupy.
    pub fn non_null_index(&self, logical: usize) -> Result<usize> {
        self.check_index(logical)?;
        Ok(self.presence.non_null_index(logical))
    }

    /// The dense position of `index`, failing with a null error when the
    /// position is absent. Every primitive accessor funnels through here.
    pub(crate) fn require_present(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        ensure!(self.presence.is_present(index), "null value at index {index}");
        Ok(self.presence.non_null_index(index))
    }

    pub fn value(&self, index: usize) -> Result<Value<'_>> {
        self.check_index(index)?;
        if !self.presence.is_present(index) {
            return Ok(Value::Null);
        }
        self.values.value(self.presence.non_null_index(index))
    }

    /// Logical position of the first null, if any.
    pub fn first_null(&self) -> Option<usize> {
        self.presence.first_absent()
    }

    pub fn last_null(&self) -> Option<usize> {
        self.presence.last_absent()
    }

    /// Value search against the dense sub-column, mapped back to logical
    /// positions. Misses report the column length: insertion points are not
    /// meaningful across gaps.
    pub fn search(&self, target: &Value<'_>, find_first: bool) -> Result<SearchOutcome> {
        if target.is_null() {
            let hit = if find_first {
                self.first_null()
            } else {
                self.last_null()
            };
            return Ok(match hit {
                Some(i) => SearchOutcome::Found(i),
                None => SearchOutcome::Insertion(self.len()),
            });
        }
        match self.values.search(target, find_first)? {
            SearchOutcome::Found(physical) => {
                Ok(SearchOutcome::Found(self.presence.logical_index(physical)?))
            }
            SearchOutcome::Insertion(_) => Ok(SearchOutcome::Insertion(self.len())),
        }
    }

    pub fn index_of(&self, target: &Value<'_>) -> Result<Option<usize>> {
        Ok(self.search(target, true)?.found())
    }

    pub fn last_index_of(&self, target: &Value<'_>) -> Result<Option<usize>> {
        Ok(self.search(target, false)?.found())
    }

    /// O(1) on the presence map; the inner column is windowed to the
    /// matching physical range.
    pub fn sub_column(&self, from: usize, to: usize) -> Result<Self> {
        ensure!(
            from <= to && to <= self.len(),
            "sub-column range {from}..{to} out of range for column of {} elements",
            self.len()
        );
        let phys_from = self.presence.non_null_index(from);
        let phys_to = self.presence.non_null_index(to);
        Ok(Self {
            values: Box::new(self.values.sub_column(phys_from, phys_to)?),
            presence: self.presence.sub(from, to),
        })
    }

    /// Identity relabeling; a nullable column carries no order claims.
    pub fn to_heap(&self) -> Self {
        self.clone()
    }

    pub fn copy(&self) -> Self {
        Self {
            values: Box::new(self.values.copy()),
            presence: self.presence.clone(),
        }
    }

    /// Null-aware concatenation.
    pub fn append(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            values: Box::new(self.values.append(other.dense())?),
            presence: self.presence.concat(&other.presence),
        })
    }

    /// Keeps the masked logical positions, nulls included.
    pub(crate) fn filter_kept(&self, keep: &BitSlice<u64, Lsb0>) -> Self {
        let mut bits = crate::bitmap::mask_zeros(keep.count_ones());
        let mut inner_keep = crate::bitmap::mask_zeros(self.values.len());
        let mut out = 0usize;
        for i in keep.iter_ones() {
            if self.presence.is_present(i) {
                bits.set(out, true);
                inner_keep.set(self.presence.non_null_index(i), true);
            }
            out += 1;
        }
        Self {
            values: Box::new(self.values.filter_kept(&inner_keep)),
            presence: PresenceMap::from_bits(bits),
        }
    }

    /// Gathers logical positions; absent positions gather as nulls.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut bits = crate::bitmap::mask_zeros(indices.len());
        let mut physical = Vec::new();
        for (out, &i) in indices.iter().enumerate() {
            self.check_index(i)?;
            if self.presence.is_present(i) {
                bits.set(out, true);
                physical.push(self.presence.non_null_index(i));
            }
        }
        Ok(Self {
            values: Box::new(self.values.select(&physical)?),
            presence: PresenceMap::from_bits(bits),
        })
    }

    /// Content equality against a non-null column: holds exactly when this
    /// column has no nulls and the present values match.
    pub fn content_equals_nonnull(&self, other: &Column) -> bool {
        self.null_count() == 0 && *self.values == *other
    }
}

impl PartialEq for NullableColumn {
    fn eq(&self, other: &Self) -> bool {
        self.presence == other.presence && self.values == other.values
    }
}
