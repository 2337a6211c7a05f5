//! Configuration module for File Uploadr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.
//!
//! # Example
//!
//! ```yaml
//! upload_root: "${UPLOADR_ROOT:-/var/lib/uploadr}"
//! post_max_size: "8m"
//! handlers:
//!   - field: avatar
//!     accept_types: '/\.(png|jpe?g)$/i'
//!     max_size: 1048576
//!     save_path: "/var/lib/uploadr/avatars"
//!   - field: attachment
//! ```

use crate::upload::handler::{DEFAULT_MAX_SIZE, DEFAULT_UPLOAD_ROOT};
use crate::upload::{AcceptPattern, HandlerConfig, PostSizeLimit, UploadHandler};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory used by handlers without their own `save_path`
    #[serde(default = "default_upload_root")]
    pub upload_root: String,

    /// Server-side ceiling on the whole request body (`"8m"`, `"512k"`, ...)
    #[serde(default)]
    pub post_max_size: PostSizeLimit,

    pub handlers: Vec<HandlerSection>,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upload_root cannot be empty".into(),
            ));
        }

        if self.handlers.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one handler must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for handler in &self.handlers {
            if handler.field.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Handler has empty field name".into(),
                ));
            }

            if !seen.insert(handler.field.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Field '{}' is configured more than once",
                    handler.field
                )));
            }

            if handler.max_size == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "Handler '{}' has max_size of 0",
                    handler.field
                )));
            }

            if matches!(&handler.save_path, Some(path) if path.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "Handler '{}' has empty save_path",
                    handler.field
                )));
            }
        }

        Ok(())
    }

    /// Build the handler configured for `field`
    pub fn handler(&self, field: &str) -> Option<UploadHandler> {
        self.handlers
            .iter()
            .find(|h| h.field == field)
            .map(|h| UploadHandler::from_config(h.resolve(&self.upload_root)))
    }

    /// Request body ceiling
    pub fn post_size_limit(&self) -> PostSizeLimit {
        self.post_max_size
    }
}

/// Per-field handler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerSection {
    pub field: String,
    #[serde(default)]
    pub accept_types: AcceptPattern,
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    #[serde(default)]
    pub save_path: Option<String>,
}

impl HandlerSection {
    /// Resolve defaults against the configured upload root
    pub fn resolve(&self, upload_root: &str) -> HandlerConfig {
        HandlerConfig {
            field_name: self.field.clone(),
            accept_pattern: self.accept_types.clone(),
            max_size: self.max_size,
            save_path: self
                .save_path
                .clone()
                .unwrap_or_else(|| upload_root.to_string()),
        }
    }
}

fn default_upload_root() -> String {
    DEFAULT_UPLOAD_ROOT.to_string()
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}
