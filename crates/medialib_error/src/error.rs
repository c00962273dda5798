//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, JsonError, StorageError};

/// Every failure a medialib operation can surface.
///
/// # Examples
///
/// ```
/// use medialib_error::{MediaError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::Io("disk full".to_string()));
/// let err: MediaError = storage_err.into();
/// assert!(format!("{}", err).contains("I/O failure"));
/// assert!(err.as_storage().is_some());
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MediaErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
}

/// Medialib error with kind discrimination.
///
/// # Examples
///
/// ```
/// use medialib_error::{ConfigError, MediaResult};
///
/// fn might_fail() -> MediaResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Medialib Error: {}", _0)]
pub struct MediaError(Box<MediaErrorKind>);

impl MediaError {
    /// Create a new error from a kind.
    pub fn new(kind: MediaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MediaErrorKind {
        &self.0
    }

    /// The storage error inside, if this is one.
    pub fn as_storage(&self) -> Option<&StorageError> {
        match self.kind() {
            MediaErrorKind::Storage(e) => Some(e),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to MediaErrorKind
impl<T> From<T> for MediaError
where
    T: Into<MediaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for medialib operations.
pub type MediaResult<T> = std::result::Result<T, MediaError>;
