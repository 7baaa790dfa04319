//! Read engine: decides when a logical read can be satisfied.
//!
//! Three read modes: a fixed byte count, a delimiter, a regex. Delimiter and
//! regex reads scan only the head chunk of the read buffer; on a miss the head
//! is doubled and rescanned until one chunk is left. A configured
//! `read_max_bytes` ceiling turns a read that can no longer fit into
//! [`StreamError::UnsatisfiableRead`].

use bstr::{BStr, ByteSlice};
use bytes::Bytes;
use regex::bytes::Regex;

use crate::chunk_queue::ChunkQueue;
use crate::error::StreamError;
use crate::transport::Transport;

/// What the pending read is waiting for.
#[derive(Debug, Clone, Copy)]
pub enum ReadMode<'a> {
    /// `count` bytes. With `partial`, any non-empty prefix up to `count`.
    Bytes { count: usize, partial: bool },
    /// Everything up to and including the first occurrence of the delimiter.
    Delimiter(&'a [u8]),
    /// Everything up to the end of the first match.
    Regex(&'a Regex),
}

impl ReadMode<'_> {
    /// Human-readable pattern for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            ReadMode::Bytes { count, .. } => format!("{count} bytes"),
            ReadMode::Delimiter(delimiter) => format!("{:?}", BStr::new(delimiter)),
            ReadMode::Regex(regex) => format!("{:?}", regex.as_str()),
        }
    }
}

/// The read buffer and its satisfaction logic.
#[derive(Debug, Default)]
pub struct ReadEngine {
    buffer: ChunkQueue,
    read_max_bytes: Option<usize>,
}

impl ReadEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(read_max_bytes: Option<usize>) -> Self {
        Self {
            buffer: ChunkQueue::new(),
            read_max_bytes,
        }
    }

    pub fn read_max_bytes(&self) -> Option<usize> {
        self.read_max_bytes
    }

    /// Set or clear (`None`) the ceiling for delimiter and regex reads.
    pub fn set_read_max_bytes(&mut self, read_max_bytes: Option<usize>) {
        self.read_max_bytes = read_max_bytes;
    }

    /// Bytes buffered and not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.total_bytes()
    }

    /// The read buffer, for inspection.
    pub fn buffer(&self) -> &ChunkQueue {
        &self.buffer
    }

    /// Append bytes obtained outside of [`pull_step`](Self::pull_step).
    pub fn feed(&mut self, chunk: Bytes) {
        self.buffer.append(chunk);
    }

    // ── Steps ────────────────────────────────────────────────────────────────

    /// Pull one chunk from the transport. Returns the bytes added, 0 when
    /// nothing was available.
    pub fn pull_step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<usize, StreamError> {
        let Some(chunk) = transport.read_from_fd()? else {
            return Ok(0);
        };
        let n = chunk.len();
        self.buffer.append(chunk);
        tracing::trace!(read = n, buffered = self.buffer.total_bytes(), "pulled chunk");
        Ok(n)
    }

    /// Length of the buffered prefix that satisfies `mode`, or `None` if more
    /// input is needed.
    pub fn find_read_position(
        &mut self,
        mode: &ReadMode<'_>,
    ) -> Result<Option<usize>, StreamError> {
        match *mode {
            ReadMode::Bytes { count, partial } => {
                let total = self.buffer.total_bytes();
                if total >= count || (partial && total > 0) {
                    Ok(Some(count.min(total)))
                } else {
                    Ok(None)
                }
            }
            ReadMode::Delimiter(delimiter) => self.scan(mode, |head| {
                head.find(delimiter).map(|loc| loc + delimiter.len())
            }),
            ReadMode::Regex(regex) => self.scan(mode, |head| regex.find(head).map(|m| m.end())),
        }
    }

    /// Remove and return the first `n` bytes.
    pub fn consume(&mut self, n: usize) -> Bytes {
        self.buffer.consume_prefix(n)
    }

    /// [`find_read_position`](Self::find_read_position) followed by
    /// [`consume`](Self::consume).
    pub fn try_read(&mut self, mode: &ReadMode<'_>) -> Result<Option<Bytes>, StreamError> {
        Ok(self.find_read_position(mode)?.map(|n| self.consume(n)))
    }

    /// Scan the head chunk, doubling it after every miss until only one chunk
    /// remains. `search` returns the end offset of a match.
    fn scan<F>(&mut self, mode: &ReadMode<'_>, mut search: F) -> Result<Option<usize>, StreamError>
    where
        F: FnMut(&[u8]) -> Option<usize>,
    {
        if self.buffer.len() == 0 {
            return Ok(None);
        }

        loop {
            let head = self.buffer.front().map_or(&[][..], |c| &c[..]);
            if let Some(end) = search(head) {
                self.check_max_bytes(mode, end)?;
                return Ok(Some(end));
            }
            if self.buffer.len() == 1 {
                break;
            }
            self.buffer.double_prefix();
        }

        // One chunk holds everything buffered and the pattern is not in it.
        let head_len = self.buffer.front().map_or(0, Bytes::len);
        self.check_max_bytes(mode, head_len)?;
        Ok(None)
    }

    fn check_max_bytes(&self, mode: &ReadMode<'_>, size: usize) -> Result<(), StreamError> {
        match self.read_max_bytes {
            Some(max_bytes) if size > max_bytes => {
                let pattern = mode.describe();
                tracing::warn!(%pattern, size, max_bytes, "read cannot be satisfied within limit");
                Err(StreamError::UnsatisfiableRead { pattern, max_bytes })
            }
            _ => Ok(()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
