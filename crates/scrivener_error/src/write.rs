//! Batch writing error types.

/// Specific error conditions for the batch write engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WriteErrorKind {
    /// The run was stopped by the caller
    #[display("Write run cancelled")]
    Cancelled,
    /// The model produced no text for a batch
    #[display("Model returned an empty response for batch starting at '{}'", _0)]
    EmptyResponse(String),
    /// The outline set id did not match any set on the novel
    #[display("Outline set not found: {}", _0)]
    UnknownOutlineSet(String),
    /// A batch referenced a chapter that vanished from the working copy
    #[display("Chapter missing from working copy: {}", _0)]
    MissingChapter(String),
    /// A run ended with outline items still unwritten
    #[display("{} outline items were left unwritten", _0)]
    Incomplete(usize),
}

/// Error type for batch writing.
///
/// # Examples
///
/// ```
/// use scrivener_error::{WriteError, WriteErrorKind};
///
/// let err = WriteError::new(WriteErrorKind::Cancelled);
/// assert!(err.is_cancelled());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Write Error: {} at line {} in {}", kind, line, file)]
pub struct WriteError {
    /// The specific error condition
    pub kind: WriteErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl WriteError {
    /// Create a new WriteError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: WriteErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error represents a caller-initiated stop.
    pub fn is_cancelled(&self) -> bool {
        self.kind == WriteErrorKind::Cancelled
    }
}
