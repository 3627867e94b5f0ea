//! Config file location and loading for the CLI.

use std::path::{Path, PathBuf};

use quire_core::config::ClientConfig;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("quire").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// File values, then `QUIRE_*` environment overrides, then validation.
pub fn load_client_config(path: &Path) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::load_from_path(path)?;
    config.apply_env_overrides()?;
    Ok(config.validate()?)
}

/// Merge `config init` flags into whatever the file already holds.
pub fn init_client_config(
    path: &Path,
    api_url: &str,
    token: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::load_from_path(path)?;
    config.api_base_url = api_url.to_string();
    if token.is_some() {
        config.api_token = token;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.request_timeout_secs = timeout_secs;
    }
    let config = config.validate()?;
    config.save_to_path(path)?;
    Ok(config)
}
