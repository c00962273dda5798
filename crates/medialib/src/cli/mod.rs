//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the medialib binary.

mod commands;
mod media;

pub use commands::{Cli, Commands};
pub use media::handle_media_command;
