//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::Settings;
use crate::config::validation::{validate_options, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate settings from TOML text.
pub fn parse_config(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml::from_str(content)?;
    validate_options(&settings.dispatcher).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Load and validate settings from a TOML file.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let settings = parse_config(&content)?;

    tracing::debug!(path = %path.display(), "Configuration file loaded");
    Ok(settings)
}
