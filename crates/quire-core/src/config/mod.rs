//! Client configuration.
//!
//! Provides a `ClientConfig` used by clients to find the workspace API. Values
//! come from a JSON file and can be overridden from the environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{normalize_base_url, normalize_text_option};

/// Default limit for a single remote call before it counts as failed.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "QUIRE_API_URL";
pub const ENV_API_TOKEN: &str = "QUIRE_API_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "QUIRE_TIMEOUT_SECS";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|error| {
            Error::Config(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })
    }

    /// Write configuration as pretty JSON, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Apply `QUIRE_*` environment variables on top of file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_API_TOKEN).ok(),
            std::env::var(ENV_TIMEOUT_SECS).ok(),
        )
    }

    fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        api_token: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<()> {
        if let Some(api_url) = normalize_text_option(api_url) {
            self.api_base_url = api_url;
        }
        if let Some(api_token) = normalize_text_option(api_token) {
            self.api_token = Some(api_token);
        }
        if let Some(timeout_secs) = normalize_text_option(timeout_secs) {
            self.request_timeout_secs = timeout_secs.parse().map_err(|_| {
                Error::Config(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{timeout_secs}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Normalize values and reject configurations that cannot work.
    pub fn validate(mut self) -> Result<Self> {
        self.api_base_url = normalize_base_url(&self.api_base_url).map_err(|error| {
            Error::Config(format!(
                "{error} (set api_base_url in the config file or {ENV_API_URL})"
            ))
        })?;
        self.api_token = normalize_text_option(self.api_token);
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
