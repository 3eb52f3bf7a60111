//! Action tag dispatch errors.

/// Error raised when an action cannot be mapped to a typed UI action.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Action Error: {} ({}) at line {} in {}", message, action_type, line, file)]
pub struct ActionError {
    /// The action type as written in the tag
    pub action_type: String,
    /// What went wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ActionError {
    /// Create a new ActionError at the current location.
    #[track_caller]
    pub fn new(action_type: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            action_type: action_type.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
