//! Credit ledger and admission errors.

/// Admission-time and ledger failure conditions.
///
/// None of these ever reach a backend; a request that fails with one of
/// them is not dispatched and nothing is charged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum LedgerErrorKind {
    /// No account exists with the given identifier
    #[display("account not found: {}", _0)]
    AccountNotFound(String),
    /// Account has fewer credits left than the request costs
    #[display("insufficient credits: {} required, {} remaining", required, remaining)]
    InsufficientCredits {
        /// Cost of the request
        required: u32,
        /// Credits left in the current window
        remaining: u32,
    },
    /// Tier requires an elevated plan
    #[display("tier {} is not available on the {} plan", tier, plan)]
    PlanRestricted {
        /// Requested tier
        tier: String,
        /// Account plan
        plan: String,
    },
    /// Durable store failed
    #[display("ledger store error: {}", _0)]
    Store(String),
}

/// Ledger error with source location tracking.
///
/// # Examples
///
/// ```
/// use tessera_error::{LedgerError, LedgerErrorKind};
///
/// let err = LedgerError::new(LedgerErrorKind::InsufficientCredits { required: 3, remaining: 1 });
/// assert!(format!("{}", err).contains("3 required"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Ledger Error: {} at line {} in {}", kind, line, file)]
pub struct LedgerError {
    /// The kind of error that occurred
    pub kind: LedgerErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl LedgerError {
    /// Create a new LedgerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: LedgerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
