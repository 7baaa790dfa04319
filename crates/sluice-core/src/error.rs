//! Error taxonomy for the buffering engine.
//!
//! "No data yet" and "would block" are flow control, not errors. They surface
//! as `Ok(None)` from `find_read_position`, `Ok(0)` from `pull_step` and
//! [`DrainStatus::Blocked`](crate::write::DrainStatus::Blocked) from
//! `drain_step`, never as a variant here.

use std::io;

/// Everything the engines can report to their direct caller.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The configured read ceiling was provably exceeded before the pattern
    /// matched. Retrying with the same ceiling cannot succeed.
    #[error("delimiter {pattern} not found within {max_bytes} bytes")]
    UnsatisfiableRead { pattern: String, max_bytes: usize },

    /// An enqueue would push the write buffer past its limit.
    /// Nothing from the rejected write was buffered.
    #[error("reached maximum write buffer size: {buffered} buffered + {attempted} > {limit}")]
    BufferFull {
        buffered: usize,
        attempted: usize,
        limit: usize,
    },

    /// The read buffer grew past its limit while waiting for a read to match.
    #[error("reached maximum read buffer size: {buffered} > {limit}")]
    ReadBufferFull { buffered: usize, limit: usize },

    /// The stream is closed. `real_error` holds the cause when one is known.
    #[error("stream is closed")]
    Closed { real_error: Option<io::Error> },

    /// Failure reported by the transport, forwarded untouched.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl StreamError {
    /// A closed-stream error with no underlying cause (orderly EOF).
    pub fn closed() -> Self {
        StreamError::Closed { real_error: None }
    }

    /// True for transport conditions that clear on a later readiness event.
    pub fn is_retriable(&self) -> bool {
        match self {
            StreamError::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// True for faults the caller should treat as fatal for the connection.
    pub fn is_protocol_fault(&self) -> bool {
        matches!(
            self,
            StreamError::UnsatisfiableRead { .. }
                | StreamError::BufferFull { .. }
                | StreamError::ReadBufferFull { .. }
        )
    }
}
