//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Author of a message in a conversation.
///
/// # Examples
///
/// ```
/// use tessera_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model, not a dialogue turn
    System,
    /// Messages from the human
    User,
    /// Messages from the model
    Assistant,
}
