//! Fixed-capacity circular byte store.
//!
//! The ring is not synchronized on its own: the owning context only touches
//! it while holding the [`OutputLock`](crate::lock::OutputLock).
//!
//! # Full vs. empty
//!
//! `write_idx == read_idx` means either "nothing stored" or "completely
//! full". The `full` and `empty` flags break the tie; every other state is
//! derived from the indices.
//!
//! # Overflow
//!
//! Writes never block and never fail. Bytes beyond the free space are
//! dropped and the caller sees a short count.

/// Circular byte buffer with capacity `N`.
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    write_idx: usize,
    read_idx: usize,
    full: bool,
    empty: bool,
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new empty ring.
    pub const fn new() -> Self {
        const { assert!(N > 0, "Ring capacity must be non-zero") };

        Self {
            buf: [0u8; N],
            write_idx: 0,
            read_idx: 0,
            full: false,
            empty: true,
        }
    }

    /// Total capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes currently stored.
    #[inline]
    pub fn used(&self) -> usize {
        if self.write_idx > self.read_idx {
            self.write_idx - self.read_idx
        } else if !self.full && !self.empty {
            N - (self.read_idx - self.write_idx)
        } else if self.full {
            N
        } else {
            0
        }
    }

    /// Bytes that can be written before data is dropped.
    #[inline]
    pub fn space(&self) -> usize {
        N - self.used()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Copy as much of `data` as fits into the ring.
    ///
    /// Returns the number of bytes stored; the rest is dropped.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let space = self.space();
        if space == 0 || data.is_empty() {
            return 0;
        }

        let len = data.len().min(space);
        if len == space {
            self.full = true;
        }

        let tail = N - self.write_idx;
        if len < tail {
            self.buf[self.write_idx..self.write_idx + len].copy_from_slice(&data[..len]);
            self.write_idx += len;
        } else {
            // Crosses the end: tail segment, then head segment.
            self.buf[self.write_idx..].copy_from_slice(&data[..tail]);
            self.buf[..len - tail].copy_from_slice(&data[tail..len]);
            self.write_idx = len - tail;
        }

        self.empty = false;
        len
    }

    /// Copy up to `out.len()` stored bytes into `out`, oldest first.
    ///
    /// Returns the number of bytes read.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let used = self.used();
        if used == 0 || out.is_empty() {
            return 0;
        }

        let len = out.len().min(used);
        if len == used {
            self.empty = true;
        }

        let tail = N - self.read_idx;
        if len < tail {
            out[..len].copy_from_slice(&self.buf[self.read_idx..self.read_idx + len]);
            self.read_idx += len;
        } else {
            out[..tail].copy_from_slice(&self.buf[self.read_idx..]);
            out[tail..len].copy_from_slice(&self.buf[..len - tail]);
            self.read_idx = len - tail;
        }

        self.full = false;
        len
    }

    /// Discard everything stored.
    #[inline]
    pub fn clear(&mut self) {
        self.write_idx = 0;
        self.read_idx = 0;
        self.full = false;
        self.empty = true;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
