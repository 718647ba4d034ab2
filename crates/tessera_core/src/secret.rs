//! Secret values that must never reach logs.

/// An API credential.
///
/// `Debug` is redacted so secrets can travel through `#[instrument]`ed code.
///
/// # Examples
///
/// ```
/// use tessera_core::Secret;
///
/// let key = Secret::new("sk-live-123");
/// assert_eq!(format!("{:?}", key), "Secret(***)");
/// assert_eq!(key.expose(), "sk-live-123");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw credential for a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}
