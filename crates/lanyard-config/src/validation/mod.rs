//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod display;
mod helpers;
mod presence;


use crate::schema::LanyardConfig;
use lanyard_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LanyardConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    presence::validate_presence(&mut errors, config);
    display::validate_display(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
