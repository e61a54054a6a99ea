//! # Configuration Management
//!
//! Centralized configuration for the preamble stage and transport adapter.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-variable overrides via `from_env()`
//!
//! ## Security Considerations
//! - The buffered-preamble cap bounds what an incomplete header can make a
//!   connection hold in memory.
//! - The settle timeout bounds how long an accept path waits on a peer that
//!   never finishes its first line.

use crate::error::{PreambleError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

use crate::protocol::stage::DEFAULT_MAX_PREAMBLE_LEN;

/// Longest legal v1 line per the PROXY protocol specification.
pub const V1_MAX_LINE_LEN: usize = 108;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PreambleConfig {
    /// Cap on bytes buffered while a verdict is pending. Exceeding it
    /// settles the connection as plain pass-through traffic.
    pub max_preamble_len: usize,

    /// How long [`crate::transport::PreambleStream::settle`] waits for a
    /// verdict before degrading to pass-through.
    pub settle_timeout: Duration,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PreambleConfig {
    fn default() -> Self {
        Self {
            max_preamble_len: DEFAULT_MAX_PREAMBLE_LEN,
            settle_timeout: Duration::from_secs(5),
            logging: LoggingConfig::default(),
        }
    }
}

impl PreambleConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| PreambleError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| PreambleError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| PreambleError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(cap) = std::env::var("PROXY_PREAMBLE_MAX_LEN") {
            if let Ok(val) = cap.parse::<usize>() {
                config.max_preamble_len = val;
            }
        }

        if let Ok(timeout) = std::env::var("PROXY_PREAMBLE_SETTLE_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.settle_timeout = Duration::from_millis(val);
            }
        }

        if let Ok(level) = std::env::var("PROXY_PREAMBLE_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PreambleError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| PreambleError::ConfigError(format!("Failed to write config file: {e}")))
    }

    /// Collect every validation problem as a human-readable message.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_preamble_len < V1_MAX_LINE_LEN {
            errors.push(format!(
                "max_preamble_len {} is below the {} byte v1 line maximum; \
                 legitimate preambles would be rejected",
                self.max_preamble_len, V1_MAX_LINE_LEN
            ));
        }

        if self.settle_timeout.is_zero() {
            errors.push("settle_timeout must be non-zero".to_string());
        }

        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PreambleError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for this crate when `RUST_LOG` is unset
    /// (trace/debug/info/warn/error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

impl LoggingConfig {
    /// Parsed `tracing` level, defaulting to INFO on an unknown name.
    pub fn level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.level.parse::<Level>().is_err() {
            errors.push(format!(
                "Invalid log level '{}' (expected trace, debug, info, warn, or error)",
                self.level
            ));
        }
        errors
    }
}
