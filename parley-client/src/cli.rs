//! Command-line argument parsing for parley
//!
//! Uses clap for argument parsing with derive macros.

use clap::Parser;
use std::path::PathBuf;

/// parley - terminal chat client with file upload
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Chat WebSocket URL
    ///
    /// Overrides `server.chat_url` from the config file.
    /// Example: ws://127.0.0.1:8000/ws
    #[arg(long, env = "PARLEY_URL")]
    pub url: Option<String>,

    /// Upload endpoint URL
    ///
    /// Overrides `server.upload_url` from the config file.
    /// Example: http://127.0.0.1:8000/data/upload
    #[arg(long, env = "PARLEY_UPLOAD_URL")]
    pub upload_url: Option<String>,

    /// Custom config file path
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Log verbosely to stderr instead of the log file
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
