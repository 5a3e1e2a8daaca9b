//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "lanyard=debug",
            LogLevel::Info => "lanyard=info",
            LogLevel::Warning => "lanyard=warn",
            LogLevel::Error => "lanyard=error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_uppercase() {
        let config: LoggingConfig = toml::from_str("level = \"WARNING\"").unwrap();
        assert_eq!(config.level, LogLevel::Warning);
        assert_eq!(config.level.as_directive(), "lanyard=warn");
    }

    #[test]
    fn log_level_defaults_to_info() {
        let config: LoggingConfig = toml::from_str("").unwrap();
        assert_eq!(config.level, LogLevel::Info);
    }
}
