//! Settings errors.

/// Settings were missing, unreadable or failed to deserialize.
///
/// Raised while layering `scrivener.toml` files and when the API key
/// variable named in `[api]` is unset.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Settings error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What went wrong, including the offending file or variable
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Records a settings failure at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrivener_error::ConfigError;
    ///
    /// let err = ConfigError::new("environment variable OPENAI_API_KEY is not set");
    /// assert!(err.message.contains("OPENAI_API_KEY"));
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
