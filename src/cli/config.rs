//! TOML configuration file support.
//!
//! Decoder settings can be kept in a file instead of passed as flags:
//!
//! ```toml
//! # mzlib.toml
//! [decode]
//! nesting = "recurse"   # warn | reject | recurse
//! threads = 4
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use mzlib::config::DecodeConfig;

/// Root configuration structure for mzlib.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Decoder settings.
    #[serde(default)]
    pub decode: DecodeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
