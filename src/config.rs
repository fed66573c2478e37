//! Configuration file parser for `feedsub.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as a warning, since they
//! are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::fetcher::{FetchSettings, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_BODY_SIZE};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Service configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP API listens on.
    pub bind: String,

    /// Path of the SQLite database file.
    pub database_path: String,

    /// Transport timeout for outbound fetches, in seconds.
    pub fetch_timeout_secs: u64,

    /// Largest response body accepted from a fetched URL.
    pub max_body_bytes: usize,

    /// User-Agent sent with outbound fetches.
    pub user_agent: String,

    /// Allow fetching localhost and private-range addresses.
    pub allow_private_networks: bool,
}

impl Default for Config {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            bind: "127.0.0.1:8080".to_string(),
            database_path: "feedsub.db".to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            max_body_bytes: DEFAULT_MAX_BODY_SIZE,
            user_agent: fetch.user_agent,
            allow_private_networks: false,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "bind",
        "database_path",
        "fetch_timeout_secs",
        "max_body_bytes",
        "user_agent",
        "allow_private_networks",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), bind = %config.bind, "Loaded configuration");
        Ok(config)
    }

    /// Transport policy for the outbound [`Fetcher`](crate::feed::Fetcher).
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            user_agent: self.user_agent.clone(),
            allow_private_networks: self.allow_private_networks,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
