//! Configuration error types.

/// Configuration error with source location.
///
/// Raised for unreadable or inconsistent configuration, and for a missing
/// backend credential at the moment it is first needed.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_error::ConfigError;
    ///
    /// let err = ConfigError::new("GROQ_API_KEY is not set");
    /// assert!(err.message.contains("GROQ_API_KEY"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
