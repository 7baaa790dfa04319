//! Buffered TCP stream.
//!
//! Wraps a connected `TcpStream` and a [`StreamBuffer`]. Reads are served
//! from the buffer when possible and otherwise pull from the socket until
//! the read is satisfied. Writes are buffered and drained opportunistically;
//! [`BufferedStream::flush`] waits for the socket to take everything.
//!
//! A read that can never be satisfied, an overfull read buffer, EOF and any
//! non-retriable socket error close the stream. After that, reads are still
//! served from data already buffered; anything needing the socket fails with
//! [`StreamError::Closed`].

use bytes::Bytes;
use regex::bytes::Regex;
use tokio::net::TcpStream;

use sluice_core::{BufferConfig, DrainStatus, ReadMode, StreamBuffer, StreamError};

use crate::transport::TcpTransport;

#[derive(Debug)]
pub struct BufferedStream {
    stream: TcpStream,
    buffer: StreamBuffer,
    closed: bool,
}

impl BufferedStream {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, &BufferConfig::default())
    }

    pub fn with_config(stream: TcpStream, config: &BufferConfig) -> Self {
        Self {
            stream,
            buffer: StreamBuffer::new(config),
            closed: false,
        }
    }

    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }

    pub fn into_inner(self) -> TcpStream {
        self.stream
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn buffered_read(&self) -> usize {
        self.buffer.buffered_read()
    }

    pub fn buffered_write(&self) -> usize {
        self.buffer.buffered_write()
    }

    /// Mark the stream closed. Reads the buffered data can satisfy are still
    /// served; writes and flushes fail.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::info!(
                unread = self.buffer.buffered_read(),
                unsent = self.buffer.buffered_write(),
                "stream closed"
            );
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Read up to and including `delimiter`.
    ///
    /// `max_bytes` overrides the configured ceiling for this read only. If the
    /// delimiter is not found within it the stream is closed and
    /// [`StreamError::UnsatisfiableRead`] is returned.
    pub async fn read_until(
        &mut self,
        delimiter: &[u8],
        max_bytes: Option<usize>,
    ) -> Result<Bytes, StreamError> {
        self.read(ReadMode::Delimiter(delimiter), max_bytes).await
    }

    /// Read up to the end of the first match of `regex`.
    pub async fn read_until_regex(
        &mut self,
        regex: &Regex,
        max_bytes: Option<usize>,
    ) -> Result<Bytes, StreamError> {
        self.read(ReadMode::Regex(regex), max_bytes).await
    }

    /// Read `count` bytes, or with `partial` whatever non-empty prefix of
    /// them is available first.
    pub async fn read_bytes(&mut self, count: usize, partial: bool) -> Result<Bytes, StreamError> {
        self.read(ReadMode::Bytes { count, partial }, None).await
    }

    async fn read(
        &mut self,
        mode: ReadMode<'_>,
        max_bytes: Option<usize>,
    ) -> Result<Bytes, StreamError> {
        self.buffer.set_read_max_bytes(max_bytes);
        let result = if self.closed {
            self.read_buffered(&mode)
        } else {
            self.read_inner(&mode).await
        };
        self.buffer.set_read_max_bytes(None);
        result.map_err(|e| self.fail(e))
    }

    /// Serve a read from what is already buffered. Used once the socket is
    /// gone.
    fn read_buffered(&mut self, mode: &ReadMode<'_>) -> Result<Bytes, StreamError> {
        match self.buffer.find_read_position(mode)? {
            Some(n) => Ok(self.buffer.consume(n)),
            None => Err(StreamError::closed()),
        }
    }

    async fn read_inner(&mut self, mode: &ReadMode<'_>) -> Result<Bytes, StreamError> {
        loop {
            if let Some(n) = self.buffer.find_read_position(mode)? {
                return Ok(self.buffer.consume(n));
            }
            self.fill().await?;
        }
    }

    /// Pull at least one chunk from the socket, waiting for readability.
    async fn fill(&mut self) -> Result<(), StreamError> {
        let read_chunk_size = self.buffer.config().read_chunk_size;
        loop {
            let mut transport = TcpTransport::new(&self.stream, read_chunk_size);
            match self.buffer.pull_step(&mut transport) {
                Ok(0) => self.stream.readable().await?,
                Ok(_) => return Ok(()),
                Err(e) if e.is_retriable() => self.stream.readable().await?,
                Err(e) => return Err(e),
            }
        }
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    /// Buffer `data` and send as much as the socket takes without waiting.
    ///
    /// A full write buffer rejects `data` with [`StreamError::BufferFull`]
    /// and leaves the stream open.
    pub fn write(&mut self, data: impl Into<Bytes>) -> Result<(), StreamError> {
        self.check_closed()?;
        self.buffer.enqueue_write(data)?;
        self.drain_available()
    }

    fn drain_available(&mut self) -> Result<(), StreamError> {
        let read_chunk_size = self.buffer.config().read_chunk_size;
        loop {
            let mut transport = TcpTransport::new(&self.stream, read_chunk_size);
            match self.buffer.drain_step(&mut transport) {
                Ok(DrainStatus::Progress(_)) => {}
                Ok(DrainStatus::Idle | DrainStatus::Blocked) => return Ok(()),
                Err(e) if e.is_retriable() => return Ok(()),
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    /// Drain the write buffer completely, waiting for writability whenever
    /// the socket is full.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        self.check_closed()?;
        let read_chunk_size = self.buffer.config().read_chunk_size;
        loop {
            let mut transport = TcpTransport::new(&self.stream, read_chunk_size);
            let blocked = match self.buffer.drain_step(&mut transport) {
                Ok(DrainStatus::Idle) => return Ok(()),
                Ok(DrainStatus::Progress(_)) => false,
                Ok(DrainStatus::Blocked) => true,
                Err(e) if e.is_retriable() => true,
                Err(e) => return Err(self.fail(e)),
            };
            if blocked {
                if let Err(e) = self.stream.writable().await {
                    return Err(self.fail(e.into()));
                }
            }
        }
    }

    // ── Closing ──────────────────────────────────────────────────────────────

    fn check_closed(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::closed())
        } else {
            Ok(())
        }
    }

    /// Close on fatal errors. Socket failures surface as `Closed` carrying
    /// the cause; a rejected enqueue leaves the stream open.
    fn fail(&mut self, err: StreamError) -> StreamError {
        let err = match err {
            StreamError::BufferFull { .. } => return err,
            StreamError::Transport(e) => {
                tracing::debug!(error = %e, "socket error");
                StreamError::Closed {
                    real_error: Some(e),
                }
            }
            other => other,
        };
        self.close();
        err
    }
}
