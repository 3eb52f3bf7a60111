//! Encoding failures for novel and script documents.

/// A novel or script could not be turned into JSON.
///
/// Parse failures on load are reported as
/// [`StorageErrorKind::Malformed`](crate::StorageErrorKind::Malformed), which
/// also names the file.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON encoding failed: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// What serde_json reported
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Records an encoding failure at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrivener_error::JsonError;
    ///
    /// let err = JsonError::new("key must be a string");
    /// assert!(err.to_string().starts_with("JSON encoding failed"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
