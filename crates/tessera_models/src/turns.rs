//! Conversation shaping for backends that require alternating turns.

use tessera_core::{Message, Role, split_system};

/// A conversation turn after the system instruction has been split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Turn {
    pub role: Role,
    pub text: String,
}

/// Split off the system instruction and merge consecutive same-role turns.
pub(crate) fn merged_turns(messages: &[Message]) -> (Option<&str>, Vec<Turn>) {
    let (system, rest) = split_system(messages);
    let mut turns: Vec<Turn> = Vec::with_capacity(rest.len());
    for message in rest {
        match turns.last_mut() {
            Some(last) if last.role == message.role => {
                last.text.push_str("\n\n");
                last.text.push_str(&message.content);
            }
            _ => turns.push(Turn {
                role: message.role,
                text: message.content.clone(),
            }),
        }
    }
    (system, turns)
}
