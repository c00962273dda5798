//! Error types for the medialib workspace.
//!
//! This crate provides the foundation error types used by every medialib crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use medialib_error::{MediaResult, StorageError, StorageErrorKind};
//!
//! fn find_media(url: &str) -> MediaResult<Vec<u8>> {
//!     Err(StorageError::new(StorageErrorKind::NotFound(url.to_string())))?
//! }
//!
//! match find_media("blob:medialib/abc") {
//!     Ok(bytes) => println!("Got {} bytes", bytes.len()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod json;
mod storage;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{MediaError, MediaErrorKind, MediaResult};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
