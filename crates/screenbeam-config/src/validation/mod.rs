//! Full configuration validation.
//!
//! Each section has its own check; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::ScreenbeamConfig;
use screenbeam_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ScreenbeamConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_signaling(&mut errors, config);
    sections::validate_capture(&mut errors, config);
    sections::validate_share(&mut errors, config);
    sections::validate_timeouts(&mut errors, config);
    sections::validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
