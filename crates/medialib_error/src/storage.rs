//! Storage error types.

/// Kinds of storage errors.
///
/// The first five variants are the failure classes the media router reasons
/// about when deciding between falling back and surfacing an error; the rest
/// describe local persistence and caller mistakes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// A backend was selected but lacks the credentials it needs
    #[display("Backend not configured: {}", _0)]
    Configuration(String),
    /// Network failure, non-success status or malformed response from a remote backend
    #[display("Transfer to {} failed: {}", provider, message)]
    Transfer {
        /// Backend that was contacted
        provider: String,
        /// What went wrong
        message: String,
    },
    /// Metadata could not be persisted into a ledger
    #[display("Ledger write failed: {}", _0)]
    LedgerWrite(String),
    /// No record or blob matches the given id or URL
    #[display("Media not found: {}", _0)]
    NotFound(String),
    /// Payload rejected before any I/O was attempted
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// Operation requires information the caller did not supply
    #[display("Precondition failed: {}", _0)]
    Precondition(String),
    /// Local filesystem failure
    #[display("I/O failure: {}", _0)]
    Io(String),
    /// A persisted record could not be decoded
    #[display("Corrupt record: {}", _0)]
    Corrupt(String),
    /// A required service (runtime, replication worker) is not running
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

impl StorageErrorKind {
    /// Build a transfer failure for the named backend.
    pub fn transfer(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transfer {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use medialib_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("blob:medialib/42".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorageErrorKind {
        &self.kind
    }

    /// True when the referenced record or blob does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StorageErrorKind::NotFound(_))
    }
}

impl From<std::io::Error> for StorageError {
    #[track_caller]
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::new(StorageErrorKind::NotFound(e.to_string()))
        } else {
            Self::new(StorageErrorKind::Io(e.to_string()))
        }
    }
}
