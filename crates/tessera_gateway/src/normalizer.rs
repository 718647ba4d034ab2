//! Uniform text stream over any adapter's chunk stream.

use futures_util::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tessera_core::StreamChunk;
use tessera_error::{UpstreamError, UpstreamErrorKind, UpstreamResult};
use tessera_interface::ChunkStream;
use tokio::time::Sleep;
use tracing::{debug, warn};

/// The lazy, finite, non-restartable text sequence handed to callers.
///
/// Wraps an adapter's [`ChunkStream`] and guarantees:
/// - chunks arrive in generation order and empty chunks are dropped
/// - the sequence ends after the first error, which is marked mid-stream
///   when any chunk was already emitted
/// - with an idle timeout set, an upstream that stays silent that long ends
///   the sequence with an `Unavailable` error
/// - the upstream connection is released as soon as the sequence ends, and
///   dropping the stream releases it immediately
///
/// Nothing is buffered beyond the single chunk pulled by [`TextStream::prime`].
pub struct TextStream {
    inner: Option<ChunkStream>,
    pending: Option<StreamChunk>,
    emitted: bool,
    idle_timeout: Option<Duration>,
    idle_deadline: Option<Pin<Box<Sleep>>>,
    provider: &'static str,
}

impl TextStream {
    /// Wrap an adapter stream.
    pub fn new(inner: ChunkStream) -> Self {
        Self {
            inner: Some(inner),
            pending: None,
            emitted: false,
            idle_timeout: None,
            idle_deadline: None,
            provider: "unknown",
        }
    }

    /// End the stream when `provider` sends nothing for `timeout`.
    ///
    /// The clock restarts every time the upstream yields an item.
    pub fn with_idle_timeout(mut self, timeout: Duration, provider: &'static str) -> Self {
        self.idle_timeout = Some(timeout);
        self.provider = provider;
        self
    }

    /// Whether any chunk has reached the caller.
    pub fn has_emitted(&self) -> bool {
        self.emitted
    }

    /// Pull up to the first non-empty chunk without emitting it.
    ///
    /// An error before the first chunk is returned here instead of being
    /// yielded, which keeps it eligible for retry and failover. A stream that
    /// completes with no text primes successfully and then yields nothing.
    /// The caller bounds how long priming may take.
    ///
    /// # Errors
    ///
    /// Returns the upstream error raised before any text was produced.
    pub async fn prime(mut self) -> UpstreamResult<Self> {
        use futures_util::StreamExt;

        let Some(inner) = self.inner.as_mut() else {
            return Ok(self);
        };
        while let Some(item) = inner.next().await {
            let chunk = item?;
            if !chunk.is_empty() {
                self.pending = Some(chunk);
                return Ok(self);
            }
        }
        debug!("Upstream stream completed without text");
        self.inner = None;
        Ok(self)
    }

    /// Drain the remaining sequence into one string.
    ///
    /// # Errors
    ///
    /// Returns the first error in the sequence.
    pub async fn collect_text(mut self) -> UpstreamResult<String> {
        use futures_util::StreamExt;

        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(chunk?.text());
        }
        Ok(text)
    }

    fn terminate(&mut self, e: UpstreamError) -> UpstreamError {
        self.inner = None;
        self.idle_deadline = None;
        if self.emitted { e.into_mid_stream() } else { e }
    }
}

impl Stream for TextStream {
    type Item = UpstreamResult<StreamChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(chunk) = this.pending.take() {
            this.emitted = true;
            return Poll::Ready(Some(Ok(chunk)));
        }

        loop {
            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };
            let polled = inner.as_mut().poll_next(cx);
            if polled.is_ready() {
                this.idle_deadline = None;
            }
            match polled {
                Poll::Pending => {
                    let Some(timeout) = this.idle_timeout else {
                        return Poll::Pending;
                    };
                    let deadline = this
                        .idle_deadline
                        .get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)));
                    if deadline.as_mut().poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    let e = UpstreamError::new(UpstreamErrorKind::Unavailable(format!(
                        "no data for {:?}",
                        timeout
                    )))
                    .with_provider(this.provider);
                    let e = this.terminate(e);
                    warn!(provider = this.provider, timeout = ?timeout, "Upstream stream stalled");
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.inner = None;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(chunk))) if chunk.is_empty() => continue,
                Poll::Ready(Some(Ok(chunk))) => {
                    this.emitted = true;
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Poll::Ready(Some(Err(e))) => {
                    let e = this.terminate(e);
                    debug!(error = %e, mid_stream = e.mid_stream, "Stream ended with error");
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream")
            .field("open", &self.inner.is_some())
            .field("pending", &self.pending.is_some())
            .field("emitted", &self.emitted)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
