//! Client configuration.
//!
//! Loaded from TOML; every key is optional. `DIRECTORY_BASE_URL` and
//! `DIRECTORY_API_KEY` override the file when set.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::outcome::FetchOrdering;

pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";
pub const DEFAULT_API_KEY: &str = "reqres-free-v1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `x-api-key` on every request. `None` disables the header.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub ordering: FetchOrdering,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: Some(DEFAULT_API_KEY.to_string()),
            timeout_secs: 30,
            ordering: FetchOrdering::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply `DIRECTORY_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup("DIRECTORY_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(api_key) = lookup("DIRECTORY_API_KEY") {
            self.api_key = (!api_key.is_empty()).then_some(api_key);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
