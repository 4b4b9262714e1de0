//! # Join Primitives
//!
//! The two intersection primitives relational joins compose from. Both work
//! through per-family comparison and search hooks; neither allocates
//! per-element.
//!
//! - [`intersect_sorted`]: dual-cursor sorted-merge over two sorted columns,
//!   O(S+T). On equality both positions are marked kept and both cursors
//!   advance, so equal runs match up to the shorter multiplicity.
//! - [`intersect_with_index`]: probes a unique sorted (DISTINCT) index with
//!   every element of an arbitrarily-ordered column, O(T·log S). The result
//!   records, per matched probe element, which index position it hit,
//!   avoiding a hash table when one side is already a unique ordered index.
//!
//! Boolean columns opt out of both primitives. The nullable wrapper's
//! null-aware variants walk present positions only: absent positions are
//! never matched, and the produced keep-masks address logical positions.
//!
//! ```text
//! sorted-merge of [1,2,4,6] and [2,3,4,5]:
//!
//!   left:   1   2   4   6        left_keep:  {1, 2}
//!   right:    2   3   4   5      right_keep: {0, 2}
//!   matches:  2,      4          matched: 2
//! ```

use crate::bitmap::{mask_zeros, Mask};
use crate::columns::{BoolColumn, Column};
use crate::types::Value;
use eyre::{bail, ensure, Result};
use std::cmp::Ordering;

/// Result of a sorted-merge intersection: one keep-mask per side plus the
/// matched cardinality. Feed the masks to the filter primitive to realize
/// the joined sides.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeIntersection {
    pub left_keep: Mask,
    pub right_keep: Mask,
    pub matched: usize,
}

/// Result of a one-sided index intersection: for every kept probe position,
/// in probe order, the index position it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeIntersection {
    pub index_positions: Vec<usize>,
    pub probe_keep: Mask,
    pub matched: usize,
}

/// Sorted-merge intersection of two sorted columns of the same kind.
pub fn intersect_sorted(left: &Column, right: &Column) -> Result<MergeIntersection> {
    if matches!(left, Column::Bool(_)) || matches!(right, Column::Bool(_)) {
        return Err(BoolColumn::order_unsupported("sorted-merge intersection"));
    }
    ensure!(
        left.scalar_type() == right.scalar_type(),
        "cannot intersect {} column with {} column",
        left.scalar_type(),
        right.scalar_type()
    );

    let left_view = DenseView::of(left, "sorted-merge intersection")?;
    let right_view = DenseView::of(right, "sorted-merge intersection")?;

    let cmp = dense_cmp(left_view.dense, right_view.dense)?;
    let mut left_keep = mask_zeros(left.len());
    let mut right_keep = mask_zeros(right.len());
    let mut matched = 0usize;
    let (mut i, mut j) = (0usize, 0usize);
    while i < left_view.positions.len() && j < right_view.positions.len() {
        match cmp(i, j) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                left_keep.set(left_view.positions[i], true);
                right_keep.set(right_view.positions[j], true);
                matched += 1;
                i += 1;
                j += 1;
            }
        }
    }
    Ok(MergeIntersection {
        left_keep,
        right_keep,
        matched,
    })
}

/// Intersects an arbitrarily-ordered probe column against a unique sorted
/// index: each probe element is binary-searched in the index; a hit records
/// the index position and keeps the probe position. Null probe positions
/// are skipped.
pub fn intersect_with_index(index: &Column, probe: &Column) -> Result<ProbeIntersection> {
    if matches!(index, Column::Bool(_)) || matches!(probe, Column::Bool(_)) {
        return Err(BoolColumn::order_unsupported("index intersection"));
    }
    ensure!(
        index.is_distinct(),
        "index intersection requires a distinct index column, got {:?}",
        index.characteristics()
    );
    ensure!(
        index.scalar_type() == probe.scalar_type(),
        "cannot intersect {} column with {} column",
        index.scalar_type(),
        probe.scalar_type()
    );

    let mut index_positions = Vec::new();
    let mut probe_keep = mask_zeros(probe.len());
    let mut matched = 0usize;
    for j in 0..probe.len() {
        let value = probe.value(j)?;
        if matches!(value, Value::Null) {
            continue;
        }
        if let Some(i) = index.search(&value, true)?.found() {
            index_positions.push(i);
            probe_keep.set(j, true);
            matched += 1;
        }
    }
    Ok(ProbeIntersection {
        index_positions,
        probe_keep,
        matched,
    })
}

/// A column reduced to its dense (non-null) values plus the logical
/// position of each.
struct DenseView<'a> {
    dense: &'a Column,
    positions: Vec<usize>,
}

impl<'a> DenseView<'a> {
    fn of(column: &'a Column, op: &str) -> Result<Self> {
        match column {
            Column::Nullable(n) => {
                ensure!(
                    n.dense().bytes_sorted(),
                    "{op} requires the present values to be sorted"
                );
                Ok(Self {
                    dense: n.dense(),
                    positions: n.presence().iter_present().collect(),
                })
            }
            other => {
                ensure!(
                    other.is_sorted(),
                    "{op} requires sorted columns, got {:?}",
                    other.characteristics()
                );
                Ok(Self {
                    dense: other,
                    positions: (0..other.len()).collect(),
                })
            }
        }
    }
}

/// Positional comparator over two non-null columns of the same kind.
fn dense_cmp<'a>(
    left: &'a Column,
    right: &'a Column,
) -> Result<Box<dyn Fn(usize, usize) -> Ordering + 'a>> {
    Ok(match (left, right) {
        (Column::Int8(a), Column::Int8(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Int16(a), Column::Int16(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Int32(a), Column::Int32(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Int64(a), Column::Int64(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Float32(a), Column::Float32(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Float64(a), Column::Float64(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Date(a), Column::Date(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Time(a), Column::Time(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Timestamp(a), Column::Timestamp(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Decimal(a), Column::Decimal(b)) => {
            a.check_value_scale(b.scale())?;
            Box::new(move |i, j| a.cmp_at(i, b, j))
        }
        (Column::Uuid(a), Column::Uuid(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Str(a), Column::Str(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (Column::Bytes(a), Column::Bytes(b)) => Box::new(move |i, j| a.cmp_at(i, b, j)),
        (a, b) => bail!(
            "cannot intersect {} column with {} column",
            a.scalar_type(),
            b.scalar_type()
        ),
    })
}
