//! Server-sent event framing shared by the streaming adapters.

use futures_util::{Stream, StreamExt};
use tessera_core::StreamChunk;
use tessera_error::{UpstreamError, UpstreamErrorKind, UpstreamResult};
use tessera_interface::ChunkStream;
use tracing::{trace, warn};

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// All `data:` lines, joined with `\n`
    pub data: String,
}

/// What an adapter makes of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseStep {
    /// Emit this text to the caller
    Text(String),
    /// Nothing for the caller (pings, metadata, empty deltas)
    Skip,
    /// Upstream signalled the end of the answer
    Done,
}

/// How a backend marks the end of a streamed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The backend sends an explicit end event; a connection that closes
    /// without one is a truncated answer
    Marker {
        /// Provider named in the truncation error
        provider: &'static str,
    },
    /// The backend simply closes the connection when done
    Close,
}

/// Incremental SSE decoder.
///
/// Network reads split events at arbitrary byte offsets, so bytes are buffered
/// until a full line is available. Both `\n` and `\r\n` line endings are
/// accepted, comment lines are ignored, and multi-line `data:` fields are
/// joined.
///
/// # Examples
///
/// ```
/// use tessera_models::SseDecoder;
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.feed(b"data: hel").is_empty());
/// let events = decoder.feed(b"lo\n\n");
/// assert_eq!(events[0].data, "hello");
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every event completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            self.process_line(line, &mut events);
        }
        events
    }

    /// Flush a trailing event left without its blank-line terminator.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            self.process_line(line.trim_end_matches('\r'), &mut events);
        }
        self.dispatch(&mut events);
        events.pop()
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => trace!(field, "Ignoring SSE field"),
        }
    }

    fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        events.push(SseEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
        });
    }
}

/// Turn a byte stream into a chunk stream.
///
/// `on_event` maps each event to a step; an error from it ends the stream
/// after being yielded. The stream also ends on [`SseStep::Done`] or when the
/// byte stream closes. Under [`StreamEnd::Marker`] a close before
/// [`SseStep::Done`] yields a final `Unavailable` error.
pub fn decode_sse<S, B, F>(bytes: S, end: StreamEnd, mut on_event: F) -> ChunkStream
where
    S: Stream<Item = UpstreamResult<B>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    F: FnMut(SseEvent) -> UpstreamResult<SseStep> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::default();
        let mut done = false;

        while !done {
            let Some(read) = bytes.next().await else {
                break;
            };
            let chunk = match read {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            for event in decoder.feed(chunk.as_ref()) {
                match on_event(event) {
                    Ok(SseStep::Text(text)) => yield Ok(StreamChunk::new(text)),
                    Ok(SseStep::Skip) => {}
                    Ok(SseStep::Done) => {
                        done = true;
                        break;
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if !done {
            if let Some(event) = decoder.finish() {
                match on_event(event) {
                    Ok(SseStep::Text(text)) => yield Ok(StreamChunk::new(text)),
                    Ok(SseStep::Done) => done = true,
                    Ok(SseStep::Skip) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if !done {
            if let StreamEnd::Marker { provider } = end {
                warn!(provider, "Stream closed before its end event");
                yield Err(UpstreamError::new(UpstreamErrorKind::Unavailable(
                    "stream closed before its end event".to_string(),
                ))
                .with_provider(provider));
            }
        }
    })
}
