//! Automation core error types.

/// Specific error conditions for the planning/execution state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AgentErrorKind {
    /// The requested operation is not allowed from the current status
    #[display("Cannot {} while {}", operation, status)]
    InvalidTransition {
        /// Operation that was attempted
        operation: String,
        /// Status the core was in
        status: String,
    },
    /// An operation needed a manifest but none was loaded
    #[display("No manifest has been planned")]
    MissingManifest,
    /// The planner response could not be turned into a manifest
    #[display("Failed to parse manifest from planner response")]
    ManifestParse,
    /// Planning failed before a response arrived
    #[display("Planning failed: {}", _0)]
    PlanningFailed(String),
    /// A task handler reported failure
    #[display("Task '{}' failed: {}", task, message)]
    TaskFailed {
        /// Task title
        task: String,
        /// Error message
        message: String,
    },
}

/// Error type for the automation core.
///
/// # Examples
///
/// ```
/// use scrivener_error::{AgentError, AgentErrorKind};
///
/// let err = AgentError::new(AgentErrorKind::MissingManifest);
/// assert!(format!("{}", err).contains("manifest"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Agent Error: {} at line {} in {}", kind, line, file)]
pub struct AgentError {
    /// The specific error condition
    pub kind: AgentErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl AgentError {
    /// Create a new AgentError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AgentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
