pub mod domains;
pub mod get;
pub mod health;
pub mod resources;
pub mod search;

use agora_core::AgoraConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("No record '{1}' from source '{0}'")]
    NotFound(String, String),

    #[error("Configuration error: {0}")]
    Config(#[from] agora_core::ConfigError),

    #[error("Domain error: {0}")]
    Domain(#[from] agora_core::DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Load the configuration file, or defaults when none is given.
///
/// Files ending in `.toml` are parsed as TOML, anything else as YAML.
pub fn load_config(path: Option<&Path>) -> Result<AgoraConfig> {
    let Some(path) = path else {
        return Ok(AgoraConfig::default());
    };

    let text = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        AgoraConfig::from_toml_str(&text)?
    } else {
        AgoraConfig::from_yaml_str(&text)?
    };
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Split a comma-separated provider list, dropping blanks.
pub fn parse_sources(sources: &str) -> Vec<String> {
    sources
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}
