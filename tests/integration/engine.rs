use crate::*;

use bytes::Bytes;
use sluice_core::{
    DrainStatus, ReadEvent, ReadMode, ScriptedTransport, StreamBuffer, StreamError, WriteEvent,
};

// ══════════════════════════════════════════════════════════════════════════════
//  StreamBuffer over a scripted transport
// ══════════════════════════════════════════════════════════════════════════════

/// Header lines arrive in awkward fragments, responses are queued while the
/// transport blocks, and EOF ends the exchange. Every retry after a block
/// offers the identical buffer.
#[test]
fn test_scripted_request_response_exchange() -> Result<()> {
    init_tracing();
    let config = BufferConfig::from_toml_str("write_chunk_size = 8\nread_max_bytes = 64")?;
    let mut buffer = StreamBuffer::new(&config);

    let mut transport = ScriptedTransport::new();
    transport
        .push_read(Bytes::from_static(b"HEAD /a HT"))
        .push_read_event(ReadEvent::Empty)
        .push_read(Bytes::from_static(b"TP/1.1\r\nHost: b\r"))
        .push_read(Bytes::from_static(b"\n\r\n"))
        .push_read_event(ReadEvent::Eof);
    transport
        .push_write(WriteEvent::Block)
        .push_write(WriteEvent::Accept(3))
        .push_write(WriteEvent::Block);

    let mode = ReadMode::Delimiter(b"\r\n");
    let mut lines = Vec::new();
    let eof = loop {
        while let Some(line) = buffer.try_read(&mode)? {
            lines.push(line.clone());
            buffer.enqueue_write(line)?;
        }
        if let Err(e) = buffer.pull_step(&mut transport) {
            break e;
        }
    };
    assert!(matches!(eof, StreamError::Closed { real_error: None }));
    assert_eq!(lines.len(), 3);
    assert_eq!(&lines[2][..], b"\r\n");

    let mut statuses = Vec::new();
    loop {
        let status = buffer.drain_step(&mut transport)?;
        if status == DrainStatus::Idle {
            break;
        }
        statuses.push(status);
    }
    assert_eq!(statuses[0], DrainStatus::Blocked);
    assert_eq!(statuses[1], DrainStatus::Progress(3));
    assert_eq!(statuses[2], DrainStatus::Blocked);

    let offered = transport.offered();
    assert_eq!(offered[0], offered[1]);
    assert_eq!(
        transport.accepted(),
        b"HEAD /a HTTP/1.1\r\nHost: b\r\n\r\n"
    );
    assert_eq!(buffer.buffered_write(), 0);
    Ok(())
}
