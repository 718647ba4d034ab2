//! Retry and single-hop failover around one logical request.

use crate::{GatewayMetrics, TextStream};
use std::future::Future;
use std::time::Duration;
use tessera_core::{BackendBinding, ChatResponse, Message, Secret};
use tessera_error::{
    RetryableError, ServiceUnavailableError, TesseraResult, UpstreamError, UpstreamErrorKind,
    UpstreamResult,
};
use tessera_interface::ProviderAdapter;
use tessera_routing::{Credentials, RetryPolicy};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::AdapterRegistry;

/// One kind of upstream call the controller can run.
trait Dispatch {
    type Output;

    fn call<'a>(
        &self,
        adapter: &'a dyn ProviderAdapter,
        messages: &'a [Message],
        model_id: &'a str,
        credential: &'a Secret,
    ) -> impl Future<Output = UpstreamResult<Self::Output>> + Send + 'a;
}

struct Complete;

impl Dispatch for Complete {
    type Output = ChatResponse;

    fn call<'a>(
        &self,
        adapter: &'a dyn ProviderAdapter,
        messages: &'a [Message],
        model_id: &'a str,
        credential: &'a Secret,
    ) -> impl Future<Output = UpstreamResult<ChatResponse>> + Send + 'a {
        adapter.complete(messages, model_id, credential)
    }
}

/// Opens the stream and waits for its first chunk, so errors raised before
/// any output stay inside the retry and failover window. Later silences are
/// bounded by `idle_timeout`.
struct Streamed {
    idle_timeout: Duration,
}

impl Dispatch for Streamed {
    type Output = TextStream;

    fn call<'a>(
        &self,
        adapter: &'a dyn ProviderAdapter,
        messages: &'a [Message],
        model_id: &'a str,
        credential: &'a Secret,
    ) -> impl Future<Output = UpstreamResult<TextStream>> + Send + 'a {
        let idle_timeout = self.idle_timeout;
        async move {
            let chunks = adapter.stream_complete(messages, model_id, credential).await?;
            TextStream::new(chunks)
                .with_idle_timeout(idle_timeout, adapter.backend().name())
                .prime()
                .await
        }
    }
}

/// Runs a request on its primary binding and, at most once, on the fallback.
///
/// The primary attempt runs under the retry policy. A failure that is still
/// transient after retries (and, for streams, happened before any output)
/// is re-issued once to the fallback binding without further retries. If
/// the fallback fails too, the caller gets one [`ServiceUnavailableError`]
/// carrying both failures. Authentication and protocol failures on the
/// primary propagate unchanged.
#[derive(Debug, Clone)]
pub struct FailoverController {
    registry: AdapterRegistry,
    credentials: Credentials,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    idle_timeout: Duration,
    fallback: BackendBinding,
}

impl FailoverController {
    /// Create a controller.
    pub fn new(
        registry: AdapterRegistry,
        credentials: Credentials,
        retry: RetryPolicy,
        attempt_timeout: Duration,
        fallback: BackendBinding,
    ) -> Self {
        Self {
            registry,
            credentials,
            retry,
            attempt_timeout,
            idle_timeout: attempt_timeout,
            fallback,
        }
    }

    /// Bound the silence between chunks of an open stream.
    ///
    /// Defaults to the attempt timeout.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// The high-availability binding used for failover.
    pub fn fallback(&self) -> &BackendBinding {
        &self.fallback
    }

    /// Run a non-streaming request.
    ///
    /// # Errors
    ///
    /// Returns the classified upstream error, a [`ServiceUnavailableError`]
    /// when the fallback hop was taken and also failed, or a configuration
    /// error when an adapter or credential is missing.
    #[instrument(skip(self, messages), fields(backend = %primary.backend, model = %primary.model_id))]
    pub async fn execute(
        &self,
        primary: &BackendBinding,
        messages: &[Message],
    ) -> TesseraResult<ChatResponse> {
        self.run(&Complete, primary, messages).await
    }

    /// Run a streaming request.
    ///
    /// The returned stream has already produced its first chunk, so failures
    /// after this point surface through the stream and never trigger failover.
    /// An upstream that stays silent past the idle timeout ends the stream
    /// with a mid-stream `Unavailable` error.
    ///
    /// # Errors
    ///
    /// Same as [`FailoverController::execute`], for failures before the first chunk.
    #[instrument(skip(self, messages), fields(backend = %primary.backend, model = %primary.model_id))]
    pub async fn execute_stream(
        &self,
        primary: &BackendBinding,
        messages: &[Message],
    ) -> TesseraResult<TextStream> {
        let dispatch = Streamed {
            idle_timeout: self.idle_timeout,
        };
        self.run(&dispatch, primary, messages).await
    }

    async fn run<D: Dispatch>(
        &self,
        dispatch: &D,
        primary: &BackendBinding,
        messages: &[Message],
    ) -> TesseraResult<D::Output> {
        let metrics = GatewayMetrics::get();
        let adapter = self.registry.adapter(primary.backend)?;
        let credential = self.credentials.resolve(&primary.credential)?;

        let started = Instant::now();
        let mut attempts = 0usize;
        let outcome = self
            .retry
            .run(|| {
                attempts += 1;
                if attempts > 1 {
                    metrics.record_retry(primary.backend.name(), &primary.model_id);
                }
                self.attempt(dispatch, adapter.as_ref(), primary, messages, &credential)
            })
            .await;

        let primary_error = match outcome {
            Ok(output) => {
                metrics.record_request(
                    primary.backend.name(),
                    &primary.model_id,
                    started.elapsed().as_secs_f64(),
                );
                return Ok(output);
            }
            Err(e) => e,
        };
        metrics.record_error(
            primary.backend.name(),
            &primary.model_id,
            primary_error.kind.label(),
        );

        if !primary_error.is_failover_eligible() {
            error!(error = %primary_error, "Primary backend failed, not failing over");
            return Err(primary_error.into());
        }
        if primary.backend == self.fallback.backend {
            warn!(error = %primary_error, "Primary is the fallback backend, no hop available");
            return Err(primary_error.into());
        }

        warn!(
            error = %primary_error,
            fallback = %self.fallback.backend,
            "Primary backend exhausted, failing over"
        );
        metrics.record_failover(primary.backend.name(), self.fallback.backend.name());

        let fallback_adapter = self.registry.adapter(self.fallback.backend)?;
        let fallback_credential = self.credentials.resolve(&self.fallback.credential)?;
        let fallback_started = Instant::now();

        match self
            .attempt(
                dispatch,
                fallback_adapter.as_ref(),
                &self.fallback,
                messages,
                &fallback_credential,
            )
            .await
        {
            Ok(output) => {
                info!(fallback = %self.fallback.backend, "Failover succeeded");
                metrics.record_request(
                    self.fallback.backend.name(),
                    &self.fallback.model_id,
                    fallback_started.elapsed().as_secs_f64(),
                );
                Ok(output)
            }
            Err(fallback_error) => {
                metrics.record_error(
                    self.fallback.backend.name(),
                    &self.fallback.model_id,
                    fallback_error.kind.label(),
                );
                error!(
                    primary = %primary_error,
                    fallback = %fallback_error,
                    "Primary and fallback both failed"
                );
                Err(ServiceUnavailableError::new(primary_error, fallback_error).into())
            }
        }
    }

    /// One bounded upstream attempt.
    async fn attempt<D: Dispatch>(
        &self,
        dispatch: &D,
        adapter: &dyn ProviderAdapter,
        binding: &BackendBinding,
        messages: &[Message],
        credential: &Secret,
    ) -> UpstreamResult<D::Output> {
        let call = dispatch.call(adapter, messages, &binding.model_id, credential);
        match tokio::time::timeout(self.attempt_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.attempt_timeout, "Upstream attempt timed out");
                Err(UpstreamError::new(UpstreamErrorKind::Unavailable(format!(
                    "no response within {:?}",
                    self.attempt_timeout
                )))
                .with_provider(binding.backend.name()))
            }
        }
    }
}
