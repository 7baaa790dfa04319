//! sluice-core: chunked read/write buffering for non-blocking streams.
//! The engines are sans-IO; `sluice-net` drives them over sockets.

pub mod buffer;
pub mod chunk_queue;
pub mod config;
pub mod error;
pub mod mask;
pub mod read;
pub mod transport;
pub mod write;

pub use buffer::StreamBuffer;
pub use chunk_queue::ChunkQueue;
pub use config::{BufferConfig, ConfigError};
pub use error::StreamError;
pub use mask::{apply_mask, apply_mask_in_place};
pub use read::{ReadEngine, ReadMode};
pub use transport::Transport;
#[cfg(any(test, feature = "test-support"))]
pub use transport::{ReadEvent, ScriptedTransport, WriteEvent};
pub use write::{DrainStatus, WriteEngine};
