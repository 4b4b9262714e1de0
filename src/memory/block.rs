//! Immutable byte blocks and the growable accumulator behind builders.

use eyre::{ensure, Result};
use std::sync::Arc;

/// An immutable byte block plus an (offset, length) window into it.
///
/// The bytes are owned by an `Arc<[u8]>`; cloning a `ByteBlock` is a handle
/// clone. Windowing with [`ByteBlock::view`] is O(1) and shares the backing
/// allocation.
#[derive(Clone)]
pub struct ByteBlock {
    bytes: Arc<[u8]>,
    start: usize,
    len: usize,
}

impl ByteBlock {
    /// Creates a block owning `bytes`, windowed over the whole allocation.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            bytes: Arc::from(bytes),
            start: 0,
            len,
        }
    }

    /// An empty block.
    pub fn empty() -> Self {
        Self {
            bytes: Arc::from(Vec::new()),
            start: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The windowed bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.start..self.start + self.len]
    }

    /// Size of the backing allocation, independent of the window.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this window covers the whole backing allocation.
    pub fn is_whole(&self) -> bool {
        self.start == 0 && self.len == self.bytes.len()
    }

    /// Returns a sub-window, relative to this window, sharing the bytes.
    pub fn view(&self, start: usize, len: usize) -> Result<Self> {
        ensure!(
            start <= self.len && len <= self.len - start,
            "block window {}..{} out of range for block of {} bytes",
            start,
            start + len,
            self.len
        );
        Ok(Self {
            bytes: Arc::clone(&self.bytes),
            start: self.start + start,
            len,
        })
    }

    /// Deep-copies the windowed bytes into a fresh minimal allocation.
    pub fn to_compact(&self) -> Self {
        Self::from_vec(self.as_slice().to_vec())
    }
}

impl std::fmt::Debug for ByteBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBlock")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("capacity", &self.bytes.len())
            .finish()
    }
}

/// A growable byte accumulator with doubling capacity.
///
/// Builders append into a `GrowableBlock` and call [`GrowableBlock::freeze`]
/// to produce an immutable [`ByteBlock`]. Freezing copies exactly the bytes
/// written so far, so the accumulator may keep growing afterwards without
/// disturbing frozen output.
#[derive(Debug, Default)]
pub struct GrowableBlock {
    buf: Vec<u8>,
}

impl GrowableBlock {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Grows capacity to at least `additional` more bytes, doubling.
    pub fn ensure_capacity(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        if needed > self.buf.capacity() {
            let doubled = self.buf.capacity().max(64) * 2;
            self.buf.reserve(doubled.max(needed) - self.buf.len());
        }
    }

    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Trim-and-copy freeze: the frozen block never aliases the live buffer.
    pub fn freeze(&self) -> ByteBlock {
        ByteBlock::from_vec(self.buf.clone())
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
