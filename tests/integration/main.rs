//! sluice integration test harness.
//!
//! Every test drives `BufferedStream` over a real loopback TCP connection.
//! Set RUST_LOG (e.g. `RUST_LOG=sluice_core=trace`) to see engine events.
//!
//!   cargo test --test integration

use std::sync::Once;

use anyhow::Result;
use sluice_core::BufferConfig;
use sluice_net::BufferedStream;
use tokio::net::{TcpListener, TcpStream};

mod closing;
mod engine;
mod limits;
mod reads;

// ── Harness ───────────────────────────────────────────────────────────────────

static TRACING: Once = Once::new();

/// Install a test subscriber once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A connected loopback pair: (client, server).
pub async fn connected_pair() -> Result<(TcpStream, TcpStream)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    Ok((client?, accepted?.0))
}

/// Both ends wrapped, the client with `config`, the server with defaults.
pub async fn buffered_pair(config: &BufferConfig) -> Result<(BufferedStream, BufferedStream)> {
    init_tracing();
    let (client, server) = connected_pair().await?;
    Ok((
        BufferedStream::with_config(client, config),
        BufferedStream::new(server),
    ))
}
