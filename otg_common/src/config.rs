//! `[shared]` table and the TOML loader used by every OTG binary.
//!
//! A block file is one serde struct with a `shared: SharedConfig` field next
//! to its own tables. [`ConfigLoader`] is implemented for every
//! `DeserializeOwned` type, so `BlockFile::load(path)` is all a binary needs.
//!
//! ```rust,no_run
//! use otg_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct BlockFile {
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let file = BlockFile::load(Path::new("config/otg_block.toml"))?;
//!     file.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to turn a TOML file into a typed configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Unreadable file or invalid TOML, including unknown fields.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// `log_level` in `[shared]`; seeds the tracing filter unless `RUST_LOG` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Fields every OTG process reads from `[shared]`.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "otg-block-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance name, attached to the startup log line.
    pub service_name: String,
}

impl SharedConfig {
    /// Rejects a blank `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// TOML loading for any deserializable config type.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and parse `path`. A missing file is [`ConfigError::FileNotFound`];
    /// any other read failure is a [`ConfigError::ParseError`].
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::ParseError(format!("{}: {e}", path.display()))
            }
        })?;

        Self::parse(&content)
    }

    /// Parse an in-memory TOML document.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
