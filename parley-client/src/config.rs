//! Client configuration loading
//!
//! Reads server endpoints and session tunables from the config file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use parley_utils::{config_file, ParleyError, Result};

use crate::session::SessionSettings;

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
}

/// Where the chat and upload endpoints live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket endpoint of the chat (default: ws://127.0.0.1:8000/ws)
    pub chat_url: String,
    /// Upload endpoint (default: http://127.0.0.1:8000/data/upload)
    pub upload_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            chat_url: "ws://127.0.0.1:8000/ws".into(),
            upload_url: format!("http://127.0.0.1:8000{}", parley_protocol::UPLOAD_PATH),
        }
    }
}

/// Session behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Greeting shown when the channel opens; empty disables it
    pub greeting: String,
    /// Seconds a success status stays visible
    pub success_clear_secs: u64,
    /// Seconds an error status stays visible
    pub failure_clear_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            greeting: "Ask me anything!".into(),
            success_clear_secs: 5,
            failure_clear_secs: 8,
        }
    }
}

impl ClientConfig {
    /// Load from the default config file
    pub fn load() -> Self {
        Self::load_from(&config_file())
    }

    /// Load from `path`
    ///
    /// Returns the defaults if the file doesn't exist or can't be parsed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::debug!(
                        "Loaded config: chat_url={}, upload_url={}",
                        config.server.chat_url,
                        config.server.upload_url
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse TOML config text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ParleyError::config(e.to_string()))
    }

    /// Replace endpoints given on the command line
    pub fn apply_overrides(&mut self, chat_url: Option<String>, upload_url: Option<String>) {
        if let Some(url) = chat_url {
            self.server.chat_url = url;
        }
        if let Some(url) = upload_url {
            self.server.upload_url = url;
        }
    }

    /// Validated chat endpoint
    pub fn chat_url(&self) -> Result<Url> {
        parse_url(&self.server.chat_url, &["ws", "wss"])
    }

    /// Validated upload endpoint
    pub fn upload_url(&self) -> Result<Url> {
        parse_url(&self.server.upload_url, &["http", "https"])
    }

    pub fn session_settings(&self) -> SessionSettings {
        let greeting = self.session.greeting.trim();
        SessionSettings {
            greeting: (!greeting.is_empty()).then(|| greeting.to_string()),
            success_clear: Duration::from_secs(self.session.success_clear_secs),
            failure_clear: Duration::from_secs(self.session.failure_clear_secs),
        }
    }
}

fn parse_url(raw: &str, schemes: &[&str]) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ParleyError::config(format!("Invalid URL '{}': {}", raw, e)))?;

    if !schemes.contains(&url.scheme()) {
        return Err(ParleyError::config(format!(
            "Unsupported scheme '{}' in '{}', expected one of: {}",
            url.scheme(),
            raw,
            schemes.join(", ")
        )));
    }

    if url.host_str().is_none() {
        return Err(ParleyError::config(format!("Missing host in URL '{}'", raw)));
    }

    Ok(url)
}
