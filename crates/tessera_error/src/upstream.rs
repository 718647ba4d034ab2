//! Upstream backend errors and retry classification.

/// Classified failure of a call to an upstream language-model backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum UpstreamErrorKind {
    /// Invalid or expired credential
    #[display("authentication failed: {}", _0)]
    Auth(String),
    /// Backend is throttling this credential
    #[display("rate limited: {}", _0)]
    RateLimited(String),
    /// Network, connection, timeout or server-side failure
    #[display("backend unavailable: {}", _0)]
    Unavailable(String),
    /// Backend returned a shape the adapter cannot decode, or rejected the request shape
    #[display("protocol error: {}", _0)]
    Protocol(String),
}

impl UpstreamErrorKind {
    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamErrorKind::Auth(_) => "auth",
            UpstreamErrorKind::RateLimited(_) => "rate_limit",
            UpstreamErrorKind::Unavailable(_) => "unavailable",
            UpstreamErrorKind::Protocol(_) => "protocol",
        }
    }

    /// Whether this kind should be retried locally against the same backend.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamErrorKind::RateLimited(_))
    }

    /// Whether this kind is transient, making the request eligible for failover.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpstreamErrorKind::RateLimited(_) | UpstreamErrorKind::Unavailable(_)
        )
    }
}

/// Upstream error with provider attribution and source location tracking.
///
/// # Examples
///
/// ```
/// use tessera_error::{RetryableError, UpstreamError, UpstreamErrorKind};
///
/// let err = UpstreamError::new(UpstreamErrorKind::RateLimited("slow down".into()))
///     .with_provider("groq")
///     .with_status(429);
///
/// assert!(err.is_retryable());
/// assert!(err.is_failover_eligible());
/// assert_eq!(err.status, Some(429));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Error ({}): {} at line {} in {}", provider, kind, line, file)]
pub struct UpstreamError {
    /// The kind of error that occurred
    pub kind: UpstreamErrorKind,
    /// Provider that produced the error
    pub provider: &'static str,
    /// HTTP status code, when the failure came from a response
    pub status: Option<u16>,
    /// True when the error surfaced after at least one chunk reached the caller
    pub mid_stream: bool,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl UpstreamError {
    /// Create a new UpstreamError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UpstreamErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            provider: "unknown",
            status: None,
            mid_stream: false,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Attribute the error to a provider.
    pub fn with_provider(mut self, provider: &'static str) -> Self {
        self.provider = provider;
        self
    }

    /// Attach the HTTP status code of the failed response.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Mark the error as having occurred after output was delivered.
    pub fn into_mid_stream(mut self) -> Self {
        self.mid_stream = true;
        self
    }
}

/// Trait for errors that support retry logic.
///
/// Only throttling is retried against the same backend. Throttling and
/// connectivity failures both make a request eligible for failover, unless the
/// caller has already received part of a streamed answer.
pub trait RetryableError {
    /// Returns true if this error should trigger a local retry.
    fn is_retryable(&self) -> bool;

    /// Returns true if this error may be recovered by switching backend.
    fn is_failover_eligible(&self) -> bool;
}

impl RetryableError for UpstreamError {
    fn is_retryable(&self) -> bool {
        !self.mid_stream && self.kind.is_retryable()
    }

    fn is_failover_eligible(&self) -> bool {
        !self.mid_stream && self.kind.is_transient()
    }
}

/// Result type for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
