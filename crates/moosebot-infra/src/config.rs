//! Configuration loader.
//!
//! Reads `{data_dir}/config.toml` into [`BotConfig`]. Unlike tunables,
//! endpoint credentials have no defaults, so a missing or malformed file
//! is an error rather than a silent fallback.

use std::path::Path;

use thiserror::Error;

use moosebot_types::config::BotConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Load configuration from `{data_dir}/config.toml`.
pub async fn load_config(data_dir: &Path) -> Result<BotConfig, ConfigError> {
    let config_path = data_dir.join("config.toml");
    let path = config_path.display().to_string();

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

    let config: BotConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");
    Ok(config)
}
