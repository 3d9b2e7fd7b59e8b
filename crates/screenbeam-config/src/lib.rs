//! screenbeam configuration system.
//!
//! TOML-based configuration with validation. All sections use sensible
//! defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ScreenbeamConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use screenbeam_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
pub fn load_config() -> Result<ScreenbeamConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path. Unlike [`load_config`], a missing
/// file is an error rather than a trigger to write defaults.
pub fn load_config_from(path: &Path) -> Result<ScreenbeamConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ScreenbeamConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
