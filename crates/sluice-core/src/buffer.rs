//! One stream's read and write buffers, sized from a [`BufferConfig`].
//!
//! The stream layer drives this: it pulls into the read side, asks whether a
//! read is satisfied, enqueues writes and drains them. Each step borrows the
//! transport, so one socket serves both directions.

use bytes::Bytes;

use crate::config::BufferConfig;
use crate::error::StreamError;
use crate::read::{ReadEngine, ReadMode};
use crate::transport::Transport;
use crate::write::{DrainStatus, WriteEngine};

#[derive(Debug)]
pub struct StreamBuffer {
    config: BufferConfig,
    reader: ReadEngine,
    writer: WriteEngine,
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new(&BufferConfig::default())
    }
}

impl StreamBuffer {
    pub fn new(config: &BufferConfig) -> Self {
        Self {
            config: config.clone(),
            reader: ReadEngine::with_max_bytes(config.read_max_bytes_limit()),
            writer: WriteEngine::new(config.max_write_buffer_limit())
                .with_chunk_size(config.write_chunk_size),
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    pub fn reader(&self) -> &ReadEngine {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut ReadEngine {
        &mut self.reader
    }

    pub fn writer(&self) -> &WriteEngine {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut WriteEngine {
        &mut self.writer
    }

    // ── Read side ────────────────────────────────────────────────────────────

    /// Pull one chunk into the read buffer.
    ///
    /// Fails with [`StreamError::ReadBufferFull`] once the buffer holds more
    /// than `max_read_buffer_size`. The pulled bytes stay buffered.
    pub fn pull_step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<usize, StreamError> {
        let n = self.reader.pull_step(transport)?;
        if let Some(limit) = self.config.max_read_buffer_limit() {
            let buffered = self.reader.buffered();
            if buffered > limit {
                tracing::warn!(buffered, limit, "read buffer full");
                return Err(StreamError::ReadBufferFull { buffered, limit });
            }
        }
        Ok(n)
    }

    pub fn find_read_position(
        &mut self,
        mode: &ReadMode<'_>,
    ) -> Result<Option<usize>, StreamError> {
        self.reader.find_read_position(mode)
    }

    pub fn consume(&mut self, n: usize) -> Bytes {
        self.reader.consume(n)
    }

    pub fn try_read(&mut self, mode: &ReadMode<'_>) -> Result<Option<Bytes>, StreamError> {
        self.reader.try_read(mode)
    }

    /// Ceiling for delimiter and regex reads. `None` restores the configured
    /// default.
    pub fn set_read_max_bytes(&mut self, read_max_bytes: Option<usize>) {
        let effective = read_max_bytes.or(self.config.read_max_bytes_limit());
        self.reader.set_read_max_bytes(effective);
    }

    pub fn buffered_read(&self) -> usize {
        self.reader.buffered()
    }

    // ── Write side ───────────────────────────────────────────────────────────

    pub fn enqueue_write(&mut self, data: impl Into<Bytes>) -> Result<(), StreamError> {
        self.writer.enqueue(data)
    }

    pub fn drain_step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<DrainStatus, StreamError> {
        self.writer.drain_step(transport)
    }

    pub fn freeze_write_buffer(&mut self) {
        self.writer.freeze();
    }

    pub fn buffered_write(&self) -> usize {
        self.writer.buffered()
    }
}
