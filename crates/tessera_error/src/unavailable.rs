//! Combined failure after a failover hop.

use crate::UpstreamError;

/// The primary backend failed transiently and the fallback hop failed too.
///
/// Reported as one "service unavailable" error instead of two separate ones.
/// Both underlying errors are kept for logs and diagnostics.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Service Unavailable: primary {} failed ({}), fallback {} failed ({})",
    primary.provider,
    primary.kind,
    fallback.provider,
    fallback.kind
)]
pub struct ServiceUnavailableError {
    /// Last error from the primary backend
    pub primary: UpstreamError,
    /// Error from the fallback backend
    pub fallback: UpstreamError,
}

impl ServiceUnavailableError {
    /// Combine the primary and fallback failures.
    pub fn new(primary: UpstreamError, fallback: UpstreamError) -> Self {
        Self { primary, fallback }
    }
}
