//! Chunk queue: FIFO of immutable byte chunks with prefix coalescing.
//!
//! Delimited reads only ever scan the head chunk. When a scan fails the head
//! is grown geometrically with [`ChunkQueue::double_prefix`], which keeps the
//! total scan work linear in the size of the final prefix instead of
//! quadratic in the number of retries.
//!
//! Chunks are `Bytes`, so splitting is a refcount bump over shared storage.
//! Merging copies into one `BytesMut` exactly once, and merging a single
//! piece never copies at all.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

/// Ordered chunks plus the running sum of their lengths.
#[derive(Debug, Default, Clone)]
pub struct ChunkQueue {
    chunks: VecDeque<Bytes>,
    total_bytes: usize,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk to the tail. Empty chunks are dropped.
    pub fn append(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.drop_sentinel();
        self.total_bytes += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Return bytes to the head of the queue, ahead of everything buffered.
    pub fn push_front(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.drop_sentinel();
        self.total_bytes += chunk.len();
        self.chunks.push_front(chunk);
    }

    /// Remove and return the head chunk.
    pub fn pop_front(&mut self) -> Option<Bytes> {
        let chunk = self.chunks.pop_front()?;
        self.total_bytes -= chunk.len();
        Some(chunk)
    }

    pub fn front(&self) -> Option<&Bytes> {
        self.chunks.front()
    }

    /// Number of chunks, including an empty sentinel if one is present.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.total_bytes == 0
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.chunks.iter()
    }

    // ── Prefix operations ────────────────────────────────────────────────────

    /// Coalesce leading chunks so the head holds at least
    /// `min(size, total_bytes)` bytes.
    ///
    /// A chunk straddling `size` is split and its tail stays queued. If the
    /// queue runs dry an empty sentinel is left so a head always exists.
    pub fn merge_prefix(&mut self, size: usize) {
        if self.chunks.len() == 1 && self.chunks[0].len() <= size {
            return;
        }

        let mut pieces: Vec<Bytes> = Vec::new();
        let mut remaining = size;
        while remaining > 0 {
            let Some(mut chunk) = self.chunks.pop_front() else {
                break;
            };
            if chunk.len() > remaining {
                let tail = chunk.split_off(remaining);
                self.chunks.push_front(tail);
            }
            remaining -= chunk.len();
            pieces.push(chunk);
        }

        match pieces.len() {
            0 => {}
            1 => self.chunks.push_front(pieces.swap_remove(0)),
            n => {
                let mut merged = BytesMut::with_capacity(size - remaining);
                for piece in &pieces {
                    merged.extend_from_slice(piece);
                }
                tracing::trace!(pieces = n, merged_len = merged.len(), "merged prefix");
                self.chunks.push_front(merged.freeze());
            }
        }

        if self.chunks.is_empty() {
            self.chunks.push_front(Bytes::new());
        }
    }

    /// Grow the head to `max(2 * first, first + second)` bytes.
    ///
    /// The `first + second` term takes the whole second chunk when the first
    /// is small. A queue with fewer than two chunks is left alone.
    pub fn double_prefix(&mut self) {
        let new_len = match (self.chunks.front(), self.chunks.get(1)) {
            (Some(first), Some(second)) => (first.len() * 2).max(first.len() + second.len()),
            _ => return,
        };
        self.merge_prefix(new_len);
    }

    /// Remove exactly the first `n` bytes as one chunk.
    ///
    /// `n` past the buffered total is clamped; `n == 0` leaves the queue
    /// untouched.
    pub fn consume_prefix(&mut self, n: usize) -> Bytes {
        let n = n.min(self.total_bytes);
        if n == 0 {
            return Bytes::new();
        }
        self.merge_prefix(n);
        self.pop_front().unwrap_or_default()
    }

    /// Detach the first `n` bytes into a fresh contiguous buffer.
    ///
    /// Unlike [`consume_prefix`](Self::consume_prefix) nothing is merged back
    /// into the queue: whole leading chunks are moved out, the last one is
    /// split and its tail stays at the head. A head chunk that already covers
    /// `n` bytes is sliced without copying.
    pub fn split_prefix(&mut self, n: usize) -> Bytes {
        let n = n.min(self.total_bytes);
        if n == 0 {
            return Bytes::new();
        }

        if let Some(head) = self.chunks.front_mut() {
            if head.len() >= n {
                let out = head.split_to(n);
                if head.is_empty() {
                    self.chunks.pop_front();
                }
                self.total_bytes -= n;
                return out;
            }
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let Some(mut chunk) = self.chunks.pop_front() else {
                break;
            };
            let want = n - out.len();
            if chunk.len() > want {
                let tail = chunk.split_off(want);
                self.chunks.push_front(tail);
            }
            out.extend_from_slice(&chunk);
        }
        self.total_bytes -= out.len();
        out.freeze()
    }

    /// A sentinel only exists while nothing is buffered.
    fn drop_sentinel(&mut self) {
        if self.total_bytes == 0 {
            self.chunks.clear();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
