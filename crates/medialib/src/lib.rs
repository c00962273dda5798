//! Medialib - multi-backend media storage
//!
//! Medialib stores uploaded media in one of three backends and keeps a
//! metadata ledger describing everything it stored.
//!
//! # Features
//!
//! - **Local object store**: durable, always-available fallback target
//! - **Hosted bucket**: HTTPS object storage with public URLs
//! - **Large-media API**: bearer-token CDN uploads
//! - **Automatic fallback**: failed remote uploads land locally, and the
//!   typed [`UploadOutcome`] says so
//! - **Replicated ledger**: local snapshot plus best-effort remote table
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use medialib::{ListOptions, MediaBlob, MediaLibraryConfig, UploadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MediaLibraryConfig::load()?;
//!     let library = config.connect().await?;
//!
//!     let blob = MediaBlob::read_from("logo.png", None).await?;
//!     let url = library.upload_file(&blob, &UploadOptions::default()).await?;
//!     println!("stored at {}", url);
//!
//!     for record in library.list_files(&ListOptions::default()).await {
//!         println!("{} {}", record.filename(), record.url());
//!     }
//!     library.flush().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `medialib_error` - Error types
//! - `medialib_core` - Records, options and settings
//! - `medialib_storage` - Backends, ledger and router
//!
//! This crate re-exports everything and adds configuration loading, logging
//! setup and the `medialib` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod logging;

pub use config::MediaLibraryConfig;
pub use logging::{init_logging, json_logs_from_env};

pub use medialib_core::{
    LOCAL_URL_SCHEME, ListOptions, MediaBlob, MediaMetadata, MediaRecord, MediaRecordBuilder,
    MediaUpdate, NetlifySettings, ProgressFn, ProgressReporter, StorageProvider, SupabaseSettings,
    UploadConstraints, UploadOptions,
};
pub use medialib_error::{
    BuilderError, BuilderErrorKind, ConfigError, JsonError, MediaError, MediaErrorKind,
    MediaResult, StorageError, StorageErrorKind,
};
pub use medialib_storage::{
    BlobHandles, DeleteReport, DeleteTarget, InMemoryLedger, LedgerCache, LocalObjectStore,
    MediaBackend, MediaLibrary, MediaLibraryBuilder, MetadataLedger, NetlifyLargeMedia,
    PostgrestLedger, RemoteLedger, StorageResult, SupabaseBucket, UploadOutcome, UploadRequest,
    generate_file_name, merge_listing, sanitize_file_name,
};
