//! Multi-backend media storage for medialib.
//!
//! This crate routes uploads, listings and deletions across three storage
//! backends and keeps a metadata ledger describing every stored blob.
//!
//! # Backends
//!
//! - [`LocalObjectStore`]: a directory-backed transactional object store that
//!   hands out process-local `blob:` handles. Always available; every failed
//!   remote upload falls back to it.
//! - [`SupabaseBucket`]: a hosted object-storage bucket reached over HTTPS.
//! - [`NetlifyLargeMedia`]: a third-party large-media API returning CDN URLs.
//!
//! # Ledger
//!
//! [`MetadataLedger`] keeps the authoritative local snapshot of all records
//! and replicates changes to an optional [`RemoteLedger`] table in the
//! background. The remote table is advisory: its failures are logged and
//! never surface to callers.
//!
//! # Example
//!
//! ```rust,no_run
//! use medialib_core::{ListOptions, MediaBlob, UploadOptions};
//! use medialib_storage::MediaLibrary;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let library = MediaLibrary::builder("/var/lib/medialib").build().await?;
//!
//! let blob = MediaBlob::new("logo.png", "image/png", vec![0u8; 1024]);
//! let url = library
//!     .upload_file(&blob, &UploadOptions::default().with_progress(|p| println!("{p}%")))
//!     .await?;
//!
//! let listing = library.list_files(&ListOptions::default().with_folder("uploads")).await;
//! assert!(listing.iter().any(|r| r.url() == &url));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod http;
mod ledger;
mod local;
mod naming;
mod netlify;
mod router;
mod supabase;

pub use backend::{MediaBackend, UploadRequest};
pub use ledger::{InMemoryLedger, LedgerCache, MetadataLedger, PostgrestLedger, RemoteLedger};
pub use local::{BlobHandles, LocalObjectStore};
pub use naming::{generate_file_name, sanitize_file_name};
pub use netlify::NetlifyLargeMedia;
pub use router::{
    DeleteReport, DeleteTarget, MediaLibrary, MediaLibraryBuilder, UploadOutcome, merge_listing,
};
pub use supabase::SupabaseBucket;

pub use medialib_error::{StorageError, StorageErrorKind};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
