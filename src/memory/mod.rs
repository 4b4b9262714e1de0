//! # Backing Memory
//!
//! This module provides the two memory primitives every column family is
//! built on:
//!
//! - [`ByteBlock`]: an immutable, reference-counted byte block with an
//!   (offset, length) window. Cloning a block clones the handle, never the
//!   bytes, so any number of column views can alias one allocation.
//! - [`GrowableBlock`]: a doubling accumulator used by builders. Freezing
//!   trims and copies, so a frozen block is never aliased by the live
//!   builder and the builder may keep accumulating afterwards.
//!
//! ## Aliasing Model
//!
//! ```text
//! +--------------------------- Arc<[u8]> ---------------------------+
//! |  elem 0  |  elem 1  |  elem 2  |  elem 3  |  elem 4  |  elem 5  |
//! +-----------------------------------------------------------------+
//!      ^________________________^        ^_______________^
//!      view A (offset 0, 3 elems)        view B (offset 3, 2 elems)
//! ```
//!
//! A view keeps the whole backing allocation alive for as long as it is
//! reachable, even when it windows only a few bytes of a large block. That
//! retention hazard is accepted; [`ByteBlock::to_compact`] produces a fresh
//! minimal allocation when a caller wants to sever the tie.

mod block;

pub use block::{ByteBlock, GrowableBlock};
