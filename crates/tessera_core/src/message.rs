//! Conversation messages and the helpers every adapter relies on.

use crate::Role;
use serde::{Deserialize, Serialize};
use tessera_error::InvalidRequestError;

/// A single text message in a conversation.
///
/// # Examples
///
/// ```
/// use tessera_core::{Message, Role};
///
/// let message = Message::user("Hello!");
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.content, "Hello!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text of the message
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Check that a conversation can be dispatched.
///
/// A conversation needs at least one user or assistant turn, and at most one
/// system message.
///
/// # Errors
///
/// Returns [`InvalidRequestError`] describing the first violation found.
pub fn validate_conversation(messages: &[Message]) -> Result<(), InvalidRequestError> {
    if messages.is_empty() {
        return Err(InvalidRequestError::new("conversation is empty"));
    }

    let system_count = messages.iter().filter(|m| m.role == Role::System).count();
    if system_count > 1 {
        return Err(InvalidRequestError::new(format!(
            "conversation has {} system messages, at most one is allowed",
            system_count
        )));
    }

    if system_count == messages.len() {
        return Err(InvalidRequestError::new(
            "conversation has no user or assistant turns",
        ));
    }

    Ok(())
}

/// Separate the system instruction from the turn-taking messages.
///
/// Turn order is preserved.
///
/// # Examples
///
/// ```
/// use tessera_core::{Message, split_system};
///
/// let messages = vec![Message::system("Be brief."), Message::user("Hi")];
/// let (system, turns) = split_system(&messages);
/// assert_eq!(system, Some("Be brief."));
/// assert_eq!(turns.len(), 1);
/// ```
pub fn split_system(messages: &[Message]) -> (Option<&str>, Vec<&Message>) {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.as_str());
    let turns = messages.iter().filter(|m| m.role != Role::System).collect();
    (system, turns)
}

/// Estimate the workload of a conversation as a word count.
///
/// # Examples
///
/// ```
/// use tessera_core::{Message, estimate_workload};
///
/// let messages = vec![Message::system("Be brief."), Message::user("What is Rust?")];
/// assert_eq!(estimate_workload(&messages), 5);
/// ```
pub fn estimate_workload(messages: &[Message]) -> u32 {
    let words: usize = messages
        .iter()
        .map(|m| m.content.split_whitespace().count())
        .sum();
    u32::try_from(words).unwrap_or(u32::MAX)
}
