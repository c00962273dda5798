//! Configuration error types.

/// Configuration loading error with source location.
///
/// Raised while reading configuration files and environment variables. A remote
/// backend that is merely missing credentials at upload time is reported as
/// [`StorageErrorKind::Configuration`](crate::StorageErrorKind::Configuration)
/// instead, which the router treats as non-fatal.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use medialib_error::ConfigError;
    ///
    /// let err = ConfigError::new("Unknown storage type: ftp");
    /// assert!(err.message.contains("Unknown storage type"));
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
