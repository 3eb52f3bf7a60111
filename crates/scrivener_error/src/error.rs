//! Top-level error wrapper types.

use crate::{
    ActionError, AgentError, CompletionError, ConfigError, JsonError, StorageError, WriteError,
};

/// Every error condition the Scrivener crates can produce.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ScrivenerError, WriteError, WriteErrorKind};
///
/// let err: ScrivenerError = WriteError::new(WriteErrorKind::Incomplete(2)).into();
/// assert!(format!("{}", err).contains("2 outline items"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ScrivenerErrorKind {
    /// Novel or script JSON could not be encoded
    #[from(JsonError)]
    Json(JsonError),
    /// Settings could not be loaded
    #[from(ConfigError)]
    Config(ConfigError),
    /// Completion API error
    #[from(CompletionError)]
    Completion(CompletionError),
    /// Automation core error
    #[from(AgentError)]
    Agent(AgentError),
    /// Batch writing error
    #[from(WriteError)]
    Write(WriteError),
    /// Action dispatch error
    #[from(ActionError)]
    Action(ActionError),
    /// File storage error
    #[from(StorageError)]
    Storage(StorageError),
}

/// Scrivener error with kind discrimination.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ScrivenerResult, ConfigError};
///
/// fn api_key() -> ScrivenerResult<String> {
///     Err(ConfigError::new("OPENAI_API_KEY is not set"))?
/// }
///
/// assert!(api_key().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Scrivener Error: {}", _0)]
pub struct ScrivenerError(Box<ScrivenerErrorKind>);

impl ScrivenerError {
    /// Create a new error from a kind.
    pub fn new(kind: ScrivenerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ScrivenerErrorKind {
        &self.0
    }

    /// Whether this error is a caller-initiated cancellation.
    ///
    /// Cancellations are never retried and never reported as failures.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind(), ScrivenerErrorKind::Write(e) if e.is_cancelled())
    }
}

// Generic From implementation for any type that converts to ScrivenerErrorKind
impl<T> From<T> for ScrivenerError
where
    T: Into<ScrivenerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Scrivener operations.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ScrivenerResult, WriteError, WriteErrorKind};
///
/// fn pick_outline(id: &str) -> ScrivenerResult<Vec<String>> {
///     Err(WriteError::new(WriteErrorKind::UnknownOutlineSet(id.to_string())))?
/// }
/// ```
pub type ScrivenerResult<T> = std::result::Result<T, ScrivenerError>;
