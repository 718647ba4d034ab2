//! Provider-agnostic results.

use serde::{Deserialize, Serialize};

/// The unified non-streaming response.
///
/// # Examples
///
/// ```
/// use tessera_core::ChatResponse;
///
/// let response = ChatResponse::new("Hello! How can I help?").with_tokens_used(12);
/// assert_eq!(response.tokens_used, Some(12));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated text
    pub content: String,
    /// Total tokens reported by the backend, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl ChatResponse {
    /// Create a response without token accounting.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens_used: None,
        }
    }

    /// Attach the backend's token count.
    pub fn with_tokens_used(mut self, tokens: u32) -> Self {
        self.tokens_used = Some(tokens);
        self
    }
}

/// An opaque unit of decoded text from a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{}", text)]
pub struct StreamChunk {
    text: String,
}

impl StreamChunk {
    /// Wrap decoded text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Borrow the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Whether the chunk carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
