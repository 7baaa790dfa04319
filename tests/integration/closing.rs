use crate::*;

use sluice_core::StreamError;
use tokio::io::AsyncWriteExt;

// ══════════════════════════════════════════════════════════════════════════════
//  EOF and closed streams
// ══════════════════════════════════════════════════════════════════════════════

/// The read that needs more than the peer sent fails with Closed; data
/// already buffered is still served afterwards.
#[tokio::test]
async fn test_eof_serves_buffered_then_closes() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let mut stream = BufferedStream::new(server);

    raw.write_all(b"last line\ntrailing").await?;
    raw.shutdown().await?;
    drop(raw);

    assert_eq!(&stream.read_until(b"\n", None).await?[..], b"last line\n");

    let err = stream.read_until(b"\n", None).await.unwrap_err();
    assert!(matches!(err, StreamError::Closed { real_error: None }), "{err}");
    assert!(stream.is_closed());
    assert_eq!(stream.buffered_read(), b"trailing".len());

    // Buffered bytes outlive the socket.
    assert_eq!(&stream.read_bytes(8, false).await?[..], b"trailing");
    assert_eq!(stream.buffered_read(), 0);
    assert!(matches!(
        stream.read_bytes(1, true).await,
        Err(StreamError::Closed { .. })
    ));
    Ok(())
}

/// Every call after close fails with Closed.
#[tokio::test]
async fn test_calls_after_close_fail() -> Result<()> {
    let (mut client, _server) = buffered_pair(&BufferConfig::default()).await?;
    client.close();

    assert!(matches!(client.write(&b"x"[..]), Err(StreamError::Closed { .. })));
    assert!(matches!(client.flush().await, Err(StreamError::Closed { .. })));
    assert!(matches!(
        client.read_bytes(1, true).await,
        Err(StreamError::Closed { .. })
    ));
    Ok(())
}
