//! Completion API error types.

/// Specific error conditions when talking to a chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CompletionErrorKind {
    /// Transport-level failure (connect, TLS, timeout)
    #[display("HTTP error: {}", _0)]
    Http(String),

    /// The endpoint answered with a non-success status
    #[display("API error (status {}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// A streamed event could not be decoded
    #[display("Stream error: {}", _0)]
    Stream(String),

    /// The response body could not be parsed
    #[display("Response parsing failed: {}", _0)]
    ResponseParsing(String),

    /// The request could not be converted to the wire format
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),

    /// The model returned no choices or empty content
    #[display("Empty response from model")]
    EmptyResponse,
}

impl CompletionErrorKind {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Stream(_) | Self::EmptyResponse => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::ResponseParsing(_) | Self::InvalidRequest(_) => false,
        }
    }
}

/// Completion error with location tracking.
///
/// # Examples
///
/// ```
/// use scrivener_error::{CompletionError, CompletionErrorKind};
///
/// let err = CompletionError::new(CompletionErrorKind::EmptyResponse);
/// assert!(format!("{}", err).contains("Empty response"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Completion Error: {} at line {} in {}", kind, line, file)]
pub struct CompletionError {
    /// The specific error condition
    pub kind: CompletionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl CompletionError {
    /// Create a new CompletionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CompletionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
