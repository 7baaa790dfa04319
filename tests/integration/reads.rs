use crate::*;

use regex::bytes::Regex;
use tokio::io::AsyncWriteExt;

// ══════════════════════════════════════════════════════════════════════════════
//  Delimiter, regex and fixed-length reads over fragmented input
// ══════════════════════════════════════════════════════════════════════════════

/// Lines split at arbitrary points across many small socket writes.
#[tokio::test]
async fn test_lines_across_fragmented_writes() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let mut stream = BufferedStream::new(server);

    let payload = b"GET / HTTP/1.1\r\nHost: example\r\nAccept: */*\r\n\r\n";
    let writer = tokio::spawn(async move {
        for piece in payload.chunks(3) {
            raw.write_all(piece).await?;
            raw.flush().await?;
            tokio::task::yield_now().await;
        }
        anyhow::Ok(raw)
    });

    let mut lines = Vec::new();
    loop {
        let line = stream.read_until(b"\r\n", Some(1024)).await?;
        if &line[..] == b"\r\n" {
            break;
        }
        lines.push(line);
    }
    let _raw = writer.await??;

    assert_eq!(lines.len(), 3);
    assert_eq!(&lines[0][..], b"GET / HTTP/1.1\r\n");
    assert_eq!(&lines[2][..], b"Accept: */*\r\n");
    assert_eq!(stream.buffered_read(), 0);
    Ok(())
}

/// A regex read returns everything up to the end of the first match.
#[tokio::test]
async fn test_regex_read() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let mut stream = BufferedStream::new(server);

    raw.write_all(b"len=12").await?;
    raw.write_all(b"34;payload").await?;

    let header = Regex::new(r"len=\d+;")?;
    let got = stream.read_until_regex(&header, None).await?;
    assert_eq!(&got[..], b"len=1234;");

    let body = stream.read_bytes(7, false).await?;
    assert_eq!(&body[..], b"payload");
    Ok(())
}

/// A fixed-length read waits for every byte; a partial one does not.
#[tokio::test]
async fn test_fixed_and_partial_reads() -> Result<()> {
    init_tracing();
    let (mut raw, server) = connected_pair().await?;
    let mut stream = BufferedStream::new(server);

    raw.write_all(b"0123").await?;
    let partial = stream.read_bytes(100, true).await?;
    assert!(!partial.is_empty() && partial.len() <= 4);
    let seen = partial.len();

    let writer = tokio::spawn(async move {
        raw.write_all(b"456789").await?;
        anyhow::Ok(raw)
    });

    let rest = stream.read_bytes(10 - seen, false).await?;
    let _raw = writer.await??;

    let mut all = partial.to_vec();
    all.extend_from_slice(&rest);
    assert_eq!(all, b"0123456789");
    Ok(())
}
