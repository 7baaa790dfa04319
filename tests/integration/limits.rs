use crate::*;

use sluice_core::StreamError;
use tokio::io::AsyncWriteExt;

// ══════════════════════════════════════════════════════════════════════════════
//  Read ceilings and the read buffer cap
// ══════════════════════════════════════════════════════════════════════════════

/// A delimiter absent from more than max_bytes of input fails the read and
/// closes the stream.
#[tokio::test]
async fn test_unsatisfiable_read_closes_stream() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let mut stream = BufferedStream::new(server);

    raw.write_all(&[b'a'; 64]).await?;

    let err = stream.read_until(b"\r\n", Some(16)).await.unwrap_err();
    match &err {
        StreamError::UnsatisfiableRead { max_bytes, .. } => assert_eq!(*max_bytes, 16),
        other => panic!("expected UnsatisfiableRead, got {other}"),
    }
    assert!(err.is_protocol_fault());
    assert!(stream.is_closed());
    Ok(())
}

/// The configured read_max_bytes applies when a read passes no ceiling.
#[tokio::test]
async fn test_configured_ceiling_applies_by_default() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let config = BufferConfig::from_toml_str("read_max_bytes = 8")?;
    let mut stream = BufferedStream::with_config(server, &config);

    raw.write_all(b"short\nmuch too long for eight\n").await?;

    assert_eq!(&stream.read_until(b"\n", None).await?[..], b"short\n");
    let err = stream.read_until(b"\n", None).await.unwrap_err();
    assert!(matches!(err, StreamError::UnsatisfiableRead { max_bytes: 8, .. }));
    Ok(())
}

/// A per-read ceiling overrides the configured one for that read only.
#[tokio::test]
async fn test_per_read_ceiling_is_scoped() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let config = BufferConfig::from_toml_str("read_max_bytes = 4")?;
    let mut stream = BufferedStream::with_config(server, &config);

    raw.write_all(b"0123456789\nab\n").await?;

    assert_eq!(&stream.read_until(b"\n", Some(64)).await?[..], b"0123456789\n");
    assert_eq!(stream.buffer().reader().read_max_bytes(), Some(4));
    assert_eq!(&stream.read_until(b"\n", None).await?[..], b"ab\n");
    Ok(())
}

/// Input piling up past max_read_buffer_size fails the read and closes.
#[tokio::test]
async fn test_read_buffer_cap() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let config = BufferConfig::from_toml_str("max_read_buffer_size = 1024\nread_chunk_size = 256")?;
    let mut stream = BufferedStream::with_config(server, &config);

    let writer = tokio::spawn(async move {
        raw.write_all(&[b'x'; 4096]).await?;
        anyhow::Ok(raw)
    });

    let err = stream.read_until(b"\n", None).await.unwrap_err();
    let _raw = writer.await??;

    assert!(matches!(err, StreamError::ReadBufferFull { limit: 1024, .. }), "{err}");
    assert!(stream.is_closed());
    Ok(())
}
