//! In-memory transport for tests. Built with `cfg(test)` or the
//! `test-support` feature.

use std::collections::VecDeque;
use std::io;

use bytes::{Bytes, BytesMut};

use crate::error::StreamError;
use crate::transport::Transport;

/// One scripted response to `read_from_fd`.
#[derive(Debug, Clone)]
pub enum ReadEvent {
    Data(Bytes),
    Empty,
    Fail(io::ErrorKind),
    Eof,
}

/// One scripted response to `write_to_fd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent {
    /// Accept at most this many bytes.
    Accept(usize),
    AcceptAll,
    /// Accept nothing (would block).
    Block,
    Fail(io::ErrorKind),
}

/// In-memory transport that replays a script and records what it was handed.
///
/// Once the read script runs out every read reports "nothing yet"; once the
/// write script runs out every write is accepted in full.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    reads: VecDeque<ReadEvent>,
    writes: VecDeque<WriteEvent>,
    offered: Vec<Bytes>,
    accepted: BytesMut,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_read(&mut self, data: impl Into<Bytes>) -> &mut Self {
        self.reads.push_back(ReadEvent::Data(data.into()));
        self
    }

    pub fn push_read_event(&mut self, event: ReadEvent) -> &mut Self {
        self.reads.push_back(event);
        self
    }

    pub fn push_write(&mut self, event: WriteEvent) -> &mut Self {
        self.writes.push_back(event);
        self
    }

    /// Every buffer passed to `write_to_fd`, in call order.
    pub fn offered(&self) -> &[Bytes] {
        &self.offered
    }

    /// Concatenation of all bytes the transport reported as accepted.
    pub fn accepted(&self) -> &[u8] {
        &self.accepted
    }
}

impl Transport for ScriptedTransport {
    fn read_from_fd(&mut self) -> Result<Option<Bytes>, StreamError> {
        match self.reads.pop_front() {
            Some(ReadEvent::Data(chunk)) => Ok(Some(chunk)),
            Some(ReadEvent::Empty) | None => Ok(None),
            Some(ReadEvent::Fail(kind)) => Err(io::Error::from(kind).into()),
            Some(ReadEvent::Eof) => Err(StreamError::closed()),
        }
    }

    fn write_to_fd(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.offered.push(Bytes::copy_from_slice(buf));
        let n = match self.writes.pop_front().unwrap_or(WriteEvent::AcceptAll) {
            WriteEvent::Accept(k) => k.min(buf.len()),
            WriteEvent::AcceptAll => buf.len(),
            WriteEvent::Block => 0,
            WriteEvent::Fail(kind) => return Err(io::Error::from(kind).into()),
        };
        self.accepted.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
