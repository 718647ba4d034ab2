//! Top-level error wrapper types.

use crate::{
    ConfigError, InvalidRequestError, LedgerError, LedgerErrorKind, ServiceUnavailableError,
    UpstreamError, UpstreamErrorKind,
};

/// Every error a Tessera operation can surface.
///
/// # Examples
///
/// ```
/// use tessera_error::{ConfigError, TesseraError};
///
/// let err: TesseraError = ConfigError::new("missing tiers.fast").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TesseraErrorKind {
    /// Classified upstream backend failure
    #[from(UpstreamError)]
    Upstream(UpstreamError),
    /// Primary and fallback both failed transiently
    #[from(ServiceUnavailableError)]
    ServiceUnavailable(ServiceUnavailableError),
    /// Admission or ledger failure
    #[from(LedgerError)]
    Ledger(LedgerError),
    /// Configuration or credential error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Request rejected before dispatch
    #[from(InvalidRequestError)]
    InvalidRequest(InvalidRequestError),
}

/// Tessera error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tessera Error: {}", _0)]
pub struct TesseraError(Box<TesseraErrorKind>);

impl TesseraError {
    /// Create a new error from a kind.
    pub fn new(kind: TesseraErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TesseraErrorKind {
        &self.0
    }

    /// The upstream classification, if this is a single-backend failure.
    pub fn upstream_kind(&self) -> Option<&UpstreamErrorKind> {
        match self.kind() {
            TesseraErrorKind::Upstream(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// The ledger classification, if this is an admission or ledger failure.
    pub fn ledger_kind(&self) -> Option<&LedgerErrorKind> {
        match self.kind() {
            TesseraErrorKind::Ledger(e) => Some(&e.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to TesseraErrorKind
impl<T> From<T> for TesseraError
where
    T: Into<TesseraErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tessera operations.
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;
