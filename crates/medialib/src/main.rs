//! Medialib CLI binary.
//!
//! This binary drives the media library from the command line:
//! - Upload files to the configured backend, falling back to local storage
//! - List, edit and delete stored media
//! - Inspect the effective configuration

use clap::Parser;
use medialib::{MediaLibraryConfig, init_logging, json_logs_from_env};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, handle_media_command};

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    init_logging(cli.verbose, cli.json_logs || json_logs_from_env())
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    let config = match &cli.config {
        Some(path) => {
            MediaLibraryConfig::from_sources(Some(path.as_path()), MediaLibraryConfig::environment())?
        }
        None => MediaLibraryConfig::load()?,
    };

    handle_media_command(cli.command, &config).await?;
    Ok(())
}
