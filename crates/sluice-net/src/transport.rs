//! `Transport` over a tokio `TcpStream`.
//!
//! Uses the non-blocking `try_read`/`try_write` calls, so a step never waits.
//! The stream layer awaits readiness between steps.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::net::TcpStream;

use sluice_core::{StreamError, Transport};

pub struct TcpTransport<'a> {
    stream: &'a TcpStream,
    read_chunk_size: usize,
}

impl<'a> TcpTransport<'a> {
    pub fn new(stream: &'a TcpStream, read_chunk_size: usize) -> Self {
        Self {
            stream,
            read_chunk_size: read_chunk_size.max(1),
        }
    }
}

impl Transport for TcpTransport<'_> {
    fn read_from_fd(&mut self) -> Result<Option<Bytes>, StreamError> {
        let mut buf = BytesMut::with_capacity(self.read_chunk_size);
        match self.stream.try_read_buf(&mut buf) {
            Ok(0) => Err(StreamError::closed()),
            Ok(_) => Ok(Some(buf.freeze())),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_to_fd(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        match self.stream.try_write(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
