//! Shared HTTP plumbing and failure classification.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tessera_error::{ConfigError, UpstreamError, UpstreamErrorKind, UpstreamResult};
use tracing::{debug, error};

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client shared by every adapter.
///
/// `read_timeout` bounds the silence between two reads, not the whole
/// response, since a streamed body may legitimately take minutes. A stalled
/// body then fails as a transport error, classified `Unavailable`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the TLS backend cannot be initialized.
pub fn build_http_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))
}

/// Classify a non-success HTTP status.
///
/// 401 is an authentication failure. 403 and 429 are throttling. 408 and
/// every 5xx (including 529 "overloaded") are availability failures. Any
/// other status means the request or response shape is wrong.
///
/// # Examples
///
/// ```
/// use tessera_error::UpstreamErrorKind;
/// use tessera_models::classify_status;
///
/// assert!(matches!(classify_status(429, "slow down"), UpstreamErrorKind::RateLimited(_)));
/// assert!(matches!(classify_status(401, "bad key"), UpstreamErrorKind::Auth(_)));
/// assert!(matches!(classify_status(529, "overloaded"), UpstreamErrorKind::Unavailable(_)));
/// assert!(matches!(classify_status(400, "bad field"), UpstreamErrorKind::Protocol(_)));
/// ```
pub fn classify_status(status: u16, body: &str) -> UpstreamErrorKind {
    let message = format!("HTTP {}: {}", status, truncate(body));
    match status {
        401 => UpstreamErrorKind::Auth(message),
        403 | 429 => UpstreamErrorKind::RateLimited(message),
        408 | 500..=599 => UpstreamErrorKind::Unavailable(message),
        _ => UpstreamErrorKind::Protocol(message),
    }
}

/// Classify a transport-level failure.
pub(crate) fn classify_transport(e: &reqwest::Error, provider: &'static str) -> UpstreamError {
    let kind = if e.is_decode() {
        UpstreamErrorKind::Protocol(format!("Failed to decode body: {}", e))
    } else {
        UpstreamErrorKind::Unavailable(format!("Request failed: {}", e))
    };
    UpstreamError::new(kind).with_provider(provider)
}

/// Build a protocol error for an undecodable payload.
pub(crate) fn protocol_error(provider: &'static str, message: impl Into<String>) -> UpstreamError {
    UpstreamError::new(UpstreamErrorKind::Protocol(message.into())).with_provider(provider)
}

/// Send a request and turn any non-success status into a classified error.
pub(crate) async fn send(request: RequestBuilder, provider: &'static str) -> UpstreamResult<Response> {
    let response = request.send().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to send request");
        classify_transport(&e, provider)
    })?;

    let status = response.status();
    if status.is_success() {
        debug!(provider, status = %status, "Upstream accepted request");
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(provider, status = %status, body = %truncate(&body), "Upstream returned error");
    Err(UpstreamError::new(classify_status(status.as_u16(), &body))
        .with_provider(provider)
        .with_status(status.as_u16()))
}

/// Read a full body and decode it as JSON.
///
/// Reading failures are transport errors; decoding failures are protocol errors.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    provider: &'static str,
) -> UpstreamResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify_transport(&e, provider))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(provider, error = %e, "Failed to parse response");
        protocol_error(provider, format!("Failed to parse response: {}", e))
    })
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
