//! JSON error types.

/// JSON encoding/decoding failure with source location.
///
/// Covers ledger snapshots, persisted object records and remote API bodies.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Create a new JsonError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use medialib_error::JsonError;
    ///
    /// let err = JsonError::new("ledger.json: expected value at line 1 column 1");
    /// assert!(err.message.starts_with("ledger.json"));
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
