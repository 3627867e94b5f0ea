use std::path::Path;

use quire_core::config::ClientConfig;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config::{init_client_config, resolve_config_path};
use crate::error::CliError;

/// Config as shown to the user; the token itself is never printed.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ConfigSummary {
    pub path: String,
    pub api_base_url: String,
    pub token_configured: bool,
    pub request_timeout_secs: u64,
}

impl ConfigSummary {
    pub fn new(path: &Path, config: &ClientConfig) -> Self {
        Self {
            path: path.display().to_string(),
            api_base_url: config.api_base_url.clone(),
            token_configured: config.api_token.is_some(),
            request_timeout_secs: config.request_timeout_secs,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let api_base_url = if self.api_base_url.is_empty() {
            "(not set)"
        } else {
            self.api_base_url.as_str()
        };
        vec![
            format!("config:   {}", self.path),
            format!("api url:  {api_base_url}"),
            format!(
                "token:    {}",
                if self.token_configured { "set" } else { "not set" }
            ),
            format!("timeout:  {}s", self.request_timeout_secs),
        ]
    }
}

pub fn run_config(
    command: ConfigCommands,
    config_path: Option<&Path>,
    as_json: bool,
) -> Result<(), CliError> {
    let path = resolve_config_path(config_path)?;

    let summary = match command {
        ConfigCommands::Init {
            api_url,
            token,
            timeout_secs,
        } => {
            let config = init_client_config(&path, &api_url, token, timeout_secs)?;
            tracing::info!("Wrote config to {}", path.display());
            ConfigSummary::new(&path, &config)
        }
        ConfigCommands::Show => {
            let mut config = ClientConfig::load_from_path(&path)?;
            config.apply_env_overrides()?;
            ConfigSummary::new(&path, &config)
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in summary.lines() {
            println!("{line}");
        }
    }
    Ok(())
}
