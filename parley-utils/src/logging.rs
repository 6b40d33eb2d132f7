//! Tracing setup for parley
//!
//! The console front end prints the conversation on stdout, so the client
//! normally writes its log to a file under [`paths::log_dir`]. `--debug`
//! switches to verbose output on stderr.

use std::path::{Path, PathBuf};

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, ParleyError, Result};

/// Environment variable holding the log filter
pub const LOG_ENV_VAR: &str = "PARLEY_LOG";

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "parley.log";

const CLIENT_FILTER: &str = "warn";
const DEBUG_FILTER: &str = "debug";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Append to this file, creating parent directories as needed
    File(PathBuf),
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub output: LogOutput,
    /// `EnvFilter` directives, e.g. "parley_client=debug,reqwest=warn"
    pub filter: String,
    /// Adds span enter/exit events and source locations
    pub verbose: bool,
}

impl LogConfig {
    /// Config for the interactive client, filter taken from `PARLEY_LOG`
    pub fn client() -> Self {
        Self::client_with_filter(std::env::var(LOG_ENV_VAR).ok())
    }

    /// Client config with an explicit filter override
    pub fn client_with_filter(filter: Option<String>) -> Self {
        Self {
            output: LogOutput::File(paths::log_dir().join(LOG_FILE_NAME)),
            filter: filter.unwrap_or_else(|| CLIENT_FILTER.into()),
            verbose: false,
        }
    }

    /// Verbose stderr logging for `--debug`
    pub fn development() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: DEBUG_FILTER.into(),
            verbose: true,
        }
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.filter)
            .map_err(|e| ParleyError::config(format!("Invalid log filter '{}': {}", self.filter, e)))
    }
}

/// Install the global subscriber described by `config`
///
/// Fails on a bad filter, an unwritable log file, or when a subscriber is
/// already installed.
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = config.env_filter()?;

    let span_events = if config.verbose {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(span_events)
        .with_file(config.verbose)
        .with_line_number(config.verbose);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match &config.output {
        LogOutput::Stderr => registry
            .with(fmt_layer.with_writer(std::io::stderr))
            .try_init(),
        LogOutput::File(path) => {
            let file = open_log_file(path)?;
            registry
                .with(fmt_layer.with_writer(file).with_ansi(false))
                .try_init()
        }
    };

    installed.map_err(|e| ParleyError::internal(format!("Failed to init logging: {}", e)))
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ParleyError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ParleyError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
}
