//! Write engine: buffers outbound data and drains it through a transport
//! that may accept part of a buffer, or none of it.
//!
//! Two states. *Idle* slices the next outbound buffer off the queue on every
//! drain step. *Frozen* holds a buffer the transport refused and offers the
//! identical bytes again on the next step, because some transports (TLS in
//! particular) require a retried write to present the same buffer.

use bytes::Bytes;

use crate::chunk_queue::ChunkQueue;
use crate::error::StreamError;
use crate::transport::Transport;

/// Upper bound on the bytes offered to the transport in one write attempt.
pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 128 * 1024;

/// Outcome of one [`WriteEngine::drain_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Nothing buffered.
    Idle,
    /// The transport accepted this many bytes.
    Progress(usize),
    /// The transport accepted nothing; the buffer is pinned for the retry.
    Blocked,
}

#[derive(Debug, Default)]
enum WriteState {
    #[default]
    Idle,
    /// `pending` was handed to the transport and not accepted. Never empty.
    Frozen { pending: Bytes },
}

/// The write buffer, its capacity limit and the drain state machine.
#[derive(Debug)]
pub struct WriteEngine {
    buffer: ChunkQueue,
    state: WriteState,
    max_write_buffer_size: Option<usize>,
    write_chunk_size: usize,
}

impl Default for WriteEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WriteEngine {
    pub fn new(max_write_buffer_size: Option<usize>) -> Self {
        Self {
            buffer: ChunkQueue::new(),
            state: WriteState::Idle,
            max_write_buffer_size,
            write_chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
        }
    }

    /// Override the per-attempt ceiling. Zero is treated as one byte.
    pub fn with_chunk_size(mut self, write_chunk_size: usize) -> Self {
        self.write_chunk_size = write_chunk_size.max(1);
        self
    }

    pub fn max_write_buffer_size(&self) -> Option<usize> {
        self.max_write_buffer_size
    }

    pub fn write_chunk_size(&self) -> usize {
        self.write_chunk_size
    }

    /// Bytes not yet accepted by the transport, pinned buffer included.
    pub fn buffered(&self) -> usize {
        self.buffer.total_bytes() + self.pending().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.buffered() == 0
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, WriteState::Frozen { .. })
    }

    /// The buffer awaiting a retry, if frozen.
    pub fn pending(&self) -> Option<&Bytes> {
        match &self.state {
            WriteState::Frozen { pending } => Some(pending),
            WriteState::Idle => None,
        }
    }

    /// Unsent bytes in transmission order: the pinned buffer, then the queue.
    pub fn unsent(&self) -> impl Iterator<Item = &Bytes> {
        self.pending().into_iter().chain(self.buffer.iter())
    }

    // ── Enqueue ──────────────────────────────────────────────────────────────

    /// Buffer `data` for sending.
    ///
    /// Rejected wholesale with [`StreamError::BufferFull`] if it would push the
    /// buffer past `max_write_buffer_size`. Large writes are stored as
    /// `write_chunk_size` slices so draining never recopies a huge chunk.
    pub fn enqueue(&mut self, data: impl Into<Bytes>) -> Result<(), StreamError> {
        let mut data: Bytes = data.into();
        if data.is_empty() {
            return Ok(());
        }

        let buffered = self.buffered();
        if let Some(limit) = self.max_write_buffer_size {
            if buffered + data.len() > limit {
                tracing::warn!(buffered, attempted = data.len(), limit, "write buffer full");
                return Err(StreamError::BufferFull {
                    buffered,
                    attempted: data.len(),
                    limit,
                });
            }
        }

        while data.len() > self.write_chunk_size {
            let head = data.split_to(self.write_chunk_size);
            self.buffer.append(head);
        }
        self.buffer.append(data);
        Ok(())
    }

    // ── Drain ────────────────────────────────────────────────────────────────

    /// Offer the next outbound buffer to the transport once.
    ///
    /// A transport error or a zero-byte acceptance pins the buffer (Frozen)
    /// so the next step retries the exact same bytes. A partial acceptance
    /// returns the unsent tail to the head of the queue.
    pub fn drain_step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<DrainStatus, StreamError> {
        let outbound = match std::mem::take(&mut self.state) {
            WriteState::Frozen { pending } => {
                tracing::debug!(len = pending.len(), "retrying pinned write buffer");
                pending
            }
            WriteState::Idle => {
                let write_len = self.write_chunk_size.min(self.buffer.total_bytes());
                if write_len == 0 {
                    return Ok(DrainStatus::Idle);
                }
                self.buffer.split_prefix(write_len)
            }
        };

        let accepted = match transport.write_to_fd(&outbound) {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(len = outbound.len(), error = %e, "write failed, buffer pinned");
                self.state = WriteState::Frozen { pending: outbound };
                return Err(e);
            }
        };

        if accepted == 0 {
            tracing::debug!(len = outbound.len(), "transport blocked, buffer pinned");
            self.state = WriteState::Frozen { pending: outbound };
            return Ok(DrainStatus::Blocked);
        }

        let accepted = accepted.min(outbound.len());
        if accepted < outbound.len() {
            self.buffer.push_front(outbound.slice(accepted..));
        }
        tracing::trace!(
            accepted,
            offered = outbound.len(),
            remaining = self.buffered(),
            "drained"
        );
        Ok(DrainStatus::Progress(accepted))
    }

    /// Pin the next outbound buffer now.
    ///
    /// Subsequent drain steps retry exactly these bytes until the transport
    /// accepts some of them. No-op when already frozen or nothing is buffered.
    pub fn freeze(&mut self) {
        if self.is_frozen() {
            return;
        }
        let write_len = self.write_chunk_size.min(self.buffer.total_bytes());
        if write_len == 0 {
            return;
        }
        let pending = self.buffer.split_prefix(write_len);
        tracing::debug!(len = pending.len(), "write buffer frozen");
        self.state = WriteState::Frozen { pending };
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
