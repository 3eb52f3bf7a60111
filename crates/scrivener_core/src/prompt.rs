//! Prompt preset entries.

use crate::{Message, Role};
use serde::{Deserialize, Serialize};

/// One message of an active prompt preset.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct PromptItem {
    /// Role the message is sent as
    role: Role,
    /// Message text
    content: String,
    /// Disabled items are not sent
    #[serde(default = "enabled_default")]
    enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl PromptItem {
    /// Creates an enabled prompt item.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            enabled: true,
        }
    }

    /// Returns a copy with the enabled flag set.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Converts to a chat message.
    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}
