//! sluice-net: drives sluice-core buffers over tokio TCP sockets.

pub mod stream;
pub mod transport;

pub use stream::BufferedStream;
pub use transport::TcpTransport;
