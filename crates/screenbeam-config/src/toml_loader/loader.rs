//! Reading the TOML file, and seeding it from the template on first run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use screenbeam_common::ConfigError;
use tracing::{debug, info};

use super::template::default_config_toml;
use crate::schema::ScreenbeamConfig;

const APP_DIR: &str = "screenbeam";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/screenbeam/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Parse a config file. Absent keys take their defaults; values are not
/// range-checked here.
pub fn load_from_path(path: &Path) -> Result<ScreenbeamConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "{}: {e}",
                path.display()
            )))
        }
    };

    let config = toml::from_str::<ScreenbeamConfig>(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "Config parsed");
    Ok(config)
}

/// Load the default config file, writing the commented template there first
/// if nothing exists yet.
pub fn load_default() -> Result<ScreenbeamConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            write_default_config(&path)?;
            Ok(ScreenbeamConfig::default())
        }
        other => other,
    }
}

/// Write the commented default template to `path`, creating parent
/// directories.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config_toml())
    };
    write().map_err(|e| {
        ConfigError::ParseError(format!("writing default config to {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}
