//! Incremental decoder for the server-push event stream.
//!
//! The wire format is a subset of the common `text/event-stream` framing:
//! `event:` and `data:` lines accumulate one pending event, a blank line is
//! the event boundary, and everything else is ignored. Reconnection and
//! resumption fields (`id:`, `retry:`) are not consulted.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Read `reader` line by line, invoking `on_event` for each complete
/// (name, data) pair, until end-of-stream or cancellation.
///
/// An event is complete only when both accumulators are non-empty at a blank
/// line; a pending event at end-of-stream is still delivered once. Read
/// errors other than end-of-stream are fatal and the pending event is
/// dropped. The reader is owned by this function, so the underlying stream is
/// released exactly once, on every exit path.
pub(crate) async fn read_event_stream<R, F>(mut reader: R, cancel: CancellationToken, mut on_event: F)
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str, &str),
{
    let mut event = String::new();
    let mut data = String::new();
    let mut line = String::new();

    loop {
        line.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            read = reader.read_line(&mut line) => read,
        };

        match read {
            // End of stream: deliver a pending event exactly once.
            Ok(0) => {
                if !event.is_empty() && !data.is_empty() {
                    on_event(&event, &data);
                }
                return;
            }
            Ok(_) => {}
            Err(err) => {
                // Fatal: the pending event is not delivered.
                warn!(error = %err, "event stream read failed");
                return;
            }
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            // Event boundary; a half-filled event stays pending.
            if !event.is_empty() && !data.is_empty() {
                on_event(&event, &data);
                event.clear();
                data.clear();
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_owned();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = rest.trim().to_owned();
        }
        // Any other line is ignored.
    }
}
