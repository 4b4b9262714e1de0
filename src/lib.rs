//! # colonnade - Immutable Columnar Storage
//!
//! colonnade is an immutable, off-heap columnar storage engine: typed
//! column containers holding large sequences of scalars backed by shared
//! contiguous byte blocks instead of per-element boxed objects. Columns
//! declare structural guarantees (non-null, sorted, distinct) that binary
//! search, set algebra, and the join primitives rely on for correctness
//! and complexity.
//!
//! ## Quick Start
//!
//! ```ignore
//! use colonnade::{Characteristics, Column, ColumnBuilder, ScalarType, Value};
//!
//! let mut builder = ColumnBuilder::new(ScalarType::Int64, Characteristics::DISTINCT)?;
//! builder.push_i64(1)?;
//! builder.push_i64(3)?;
//! builder.push_i64(7)?;
//! let column = builder.build()?;
//!
//! assert_eq!(column.index_of(&Value::Int64(3))?, Some(1));
//! assert_eq!(column.ceiling(&Value::Int64(4))?, Some(Value::Int64(7)));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Public Contract (Column dispatch)      │
//! ├──────────────────┬──────────────────────┤
//! │   Set Algebra    │   Join Primitives     │
//! │  filter/select/  │  sorted-merge and     │
//! │     append       │  index intersection   │
//! ├──────────────────┴──────────────────────┤
//! │  Typed Families (bool / fixed / decimal │
//! │  / varlen) + Nullable Wrapper            │
//! ├─────────────────────────────────────────┤
//! │  Characteristics State Machine           │
//! ├──────────────────┬──────────────────────┤
//! │  Presence Bitmap │  Binary Serialization │
//! │  + Rank Cache    │  (bodies + header)    │
//! ├──────────────────┴──────────────────────┤
//! │  Backing Blocks (Arc-shared, windowed)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Immutability Model
//!
//! Columns are frozen at construction: every operation returns a new view
//! or a new column, and views alias their backing block through `Arc`.
//! Frozen columns are `Send + Sync` and share freely across threads without
//! locking. The only mutable object is [`ColumnBuilder`], which is confined
//! to one thread while accumulating and stays reusable after `build()`.
//!
//! ## Module Overview
//!
//! - [`memory`]: `Arc`-shared backing blocks and the growable accumulator
//! - [`bitmap`]: presence maps with rank caches, positional keep-masks
//! - [`types`]: scalar type enum and the borrowing runtime value
//! - [`columns`]: the typed families, builders, and the `Column` union
//! - [`algebra`]: positional filter, gather-by-index, ordered append
//! - [`join`]: sorted-merge and binary-search intersection
//! - [`encoding`]: per-column wire bodies and the file header

mod macros;

pub mod algebra;
pub mod bitmap;
pub mod columns;
pub mod encoding;
pub mod join;
pub mod memory;
pub mod types;

pub use bitmap::{Mask, PresenceMap};
pub use columns::{
    BoolColumn, Characteristics, Column, ColumnBuilder, DecimalColumn, FixedColumn, FixedElem,
    NullableColumn, SearchOutcome, VarLenColumn,
};
pub use encoding::{read_column, read_columns, write_column, write_columns, ColumnMeta};
pub use join::{MergeIntersection, ProbeIntersection};
pub use memory::ByteBlock;
pub use types::{ScalarType, Value};
