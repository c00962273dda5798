//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use medialib::StorageProvider;
use std::path::PathBuf;

/// Medialib - upload, list, edit and delete media across storage backends
#[derive(Parser, Debug)]
#[command(name = "medialib")]
#[command(about = "Upload, list, edit and delete media across storage backends", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Read configuration from this file instead of the standard locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file
    Upload {
        /// File to upload
        path: PathBuf,

        /// Destination folder
        #[arg(long, default_value = "uploads")]
        folder: String,

        /// Stored filename (generated when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Backend to use instead of the configured default
        #[arg(long)]
        storage: Option<StorageArg>,

        /// Alternative text
        #[arg(long)]
        alt: Option<String>,

        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// List stored media, newest first
    List {
        /// Only this folder
        #[arg(long)]
        folder: Option<String>,

        /// Only MIME types starting with this prefix (e.g. `image/`)
        #[arg(long = "type")]
        mime_prefix: Option<String>,

        /// Maximum number of records
        #[arg(long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Delete media by id and url pairs
    Delete {
        /// Alternating ids and urls: <ID> <URL> [<ID> <URL> ...]
        #[arg(required = true, num_args = 2..)]
        items: Vec<String>,
    },

    /// Edit a record's filename, alt text or folder
    Edit {
        /// Record id
        id: String,

        /// New filename
        #[arg(long)]
        name: Option<String>,

        /// New alt text
        #[arg(long)]
        alt: Option<String>,

        /// New folder label
        #[arg(long)]
        folder: Option<String>,
    },

    /// Print the effective configuration with secrets masked
    Config,
}

/// Storage backend choices
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StorageArg {
    /// Local object store
    Local,
    /// Large-media API
    Netlify,
    /// Hosted bucket
    Supabase,
}

impl From<StorageArg> for StorageProvider {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Local => StorageProvider::Local,
            StorageArg::Netlify => StorageProvider::Netlify,
            StorageArg::Supabase => StorageProvider::Supabase,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
