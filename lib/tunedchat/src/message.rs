use serde::{Deserialize, Serialize};

/// Actor attached to a single chat message.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
}

/// One turn of a conversation. Immutable once created; ordering within a
/// conversation is chronological and meaningful.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Builds the role-tagged sequence sent upstream: an optional leading system
/// message (only when `system_prompt` is non-empty), the prior history in
/// its original order, then the new message tagged as the user, last.
#[must_use]
pub fn assemble(system_prompt: &str, history: &[Message], new_message: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);

    if !system_prompt.is_empty() {
        messages.push(Message::new(Role::System, system_prompt));
    }

    messages.extend_from_slice(history);
    messages.push(Message::new(Role::User, new_message));

    messages
}
