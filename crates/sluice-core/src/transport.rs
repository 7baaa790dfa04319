//! Transport seam: the non-blocking read/write primitive the engines drive.
//!
//! The engines never own a transport. Each step borrows one for a single
//! call, so the read side and the write side can share the same socket.

use bytes::Bytes;

use crate::error::StreamError;

/// A non-blocking byte transport.
pub trait Transport {
    /// Read whatever is available right now.
    ///
    /// `Ok(None)` means nothing is available yet. EOF is reported as
    /// [`StreamError::Closed`].
    fn read_from_fd(&mut self) -> Result<Option<Bytes>, StreamError>;

    /// Offer `buf` to the transport and return how many bytes it accepted.
    /// `Ok(0)` means the transport would block.
    fn write_to_fd(&mut self, buf: &[u8]) -> Result<usize, StreamError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_from_fd(&mut self) -> Result<Option<Bytes>, StreamError> {
        (**self).read_from_fd()
    }

    fn write_to_fd(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        (**self).write_to_fd(buf)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod scripted;

#[cfg(any(test, feature = "test-support"))]
pub use scripted::{ReadEvent, ScriptedTransport, WriteEvent};
