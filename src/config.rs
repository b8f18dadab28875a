//! Configuration file management for sslwatch.
//!
//! Connection and output settings can be kept in a TOML file so that fleet
//! scripts only have to pass the target on the command line.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (`sslwatch.toml` or specified with `--config`)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! port = "8443"
//! short = true
//! timeout_secs = 10
//! log_level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "sslwatch.toml";

pub const DEFAULT_PORT: &str = "443";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings shared by every invocation.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// TCP port for network fetches
    pub port: Option<String>,
    /// IP address to dial instead of resolving the domain
    pub ipaddr: Option<String>,
    /// Print only the number of days remaining
    pub short: Option<bool>,
    /// Connect and read timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` - File could not be read
    /// * `ConfigError::Parse` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Built-in defaults: port 443, full report, 30 second timeout,
    /// `warn` logging.
    pub fn defaults() -> Self {
        Config {
            port: Some(DEFAULT_PORT.to_string()),
            ipaddr: None,
            short: Some(false),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// A field set in `other` overrides this one; a `None` keeps the
    /// current value.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.ipaddr.is_some() {
            self.ipaddr = other.ipaddr;
        }
        if other.short.is_some() {
            self.short = other.short;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self
    }

    /// Builds the command-line layer. Only flags the user actually gave
    /// should be `Some`.
    pub fn from_cli_args(
        port: Option<String>,
        ipaddr: Option<String>,
        short: Option<bool>,
    ) -> Self {
        Config {
            port,
            ipaddr,
            short,
            timeout_secs: None,
            log_level: None,
        }
    }

    /// Resolves the file layer: an explicit path must load, the implicit
    /// `sslwatch.toml` is used only when present.
    ///
    /// # Errors
    ///
    /// Propagates [`Config::from_file`] errors.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        match explicit {
            Some(path) => Config::from_file(path).map(Some),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Config::from_file(implicit).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    pub fn port(&self) -> &str {
        self.port.as_deref().unwrap_or(DEFAULT_PORT)
    }

    pub fn ipaddr(&self) -> &str {
        self.ipaddr.as_deref().unwrap_or_default()
    }

    pub fn short(&self) -> bool {
        self.short.unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            port: Some("8443".to_string()),
            ipaddr: Some("192.0.2.10".to_string()),
            short: Some(false),
            timeout_secs: Some(10),
            log_level: Some("info".to_string()),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("IO Error: {0}")]
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    #[error("Parse Error: {0}")]
    Parse(String),
}
