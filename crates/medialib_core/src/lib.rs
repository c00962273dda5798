//! Core data types for medialib.
//!
//! This crate defines the vocabulary shared by every storage backend and by the
//! media router: the [`MediaRecord`] ledger entry, the [`StorageProvider`] tag
//! that says where a blob physically lives, the payload and option types
//! callers hand to the router, and progress reporting.
//!
//! # Example
//!
//! ```rust
//! use medialib_core::{ListOptions, MediaBlob, StorageProvider, UploadOptions};
//!
//! let blob = MediaBlob::new("logo.png", "image/png", vec![0u8; 1024]);
//! let options = UploadOptions::default()
//!     .with_folder("operator-logos")
//!     .with_storage_type(StorageProvider::Local);
//!
//! assert_eq!(options.folder(), "operator-logos");
//! assert_eq!(blob.size_bytes(), 1024);
//!
//! let listing = ListOptions::default().with_folder("operator-logos").with_limit(10usize);
//! assert_eq!(*listing.limit(), Some(10));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod options;
mod progress;
mod provider;
mod record;
mod settings;

pub use blob::MediaBlob;
pub use options::{ListOptions, MediaUpdate, UploadConstraints, UploadOptions};
pub use progress::{ProgressFn, ProgressReporter};
pub use provider::StorageProvider;
pub use record::{MediaMetadata, MediaRecord, MediaRecordBuilder, LOCAL_URL_SCHEME};
pub use settings::{NetlifySettings, SupabaseSettings};
