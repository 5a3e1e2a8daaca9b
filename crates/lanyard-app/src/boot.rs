//! Startup wiring: config resolution, logging and session settings.

use std::path::Path;
use std::time::Duration;

use lanyard_common::ConfigError;
use lanyard_config::schema::{LoggingConfig, PresenceConfig};
use lanyard_config::LanyardConfig;
use lanyard_presence::SessionConfig;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const DEFAULT_DIRECTIVE: &str = "lanyard=info";

/// Load the config from `path` when given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<LanyardConfig, ConfigError> {
    match path {
        Some(path) => lanyard_config::load_config_from(path),
        None => lanyard_config::load_config(),
    }
}

/// Filter directive from the CLI override, falling back to the config.
///
/// A bare level such as `debug` is scoped to this program's crates.
pub fn log_directive(cli_level: Option<&str>, logging: &LoggingConfig) -> String {
    match cli_level.map(str::trim).filter(|l| !l.is_empty()) {
        Some(level) if level.contains('=') => level.to_string(),
        Some(level) => format!("lanyard={}", level.to_ascii_lowercase()),
        None => logging.level.as_directive().to_string(),
    }
}

/// Handle used to swap the filter once the config has been read.
pub type LogHandle = reload::Handle<EnvFilter, Registry>;

/// `RUST_LOG` plus `directive`; an unparsable directive falls back to the default.
fn env_filter(directive: &str) -> EnvFilter {
    let directive = directive
        .parse()
        .unwrap_or_else(|_| DEFAULT_DIRECTIVE.parse().expect("default directive is valid"));
    EnvFilter::from_default_env().add_directive(directive)
}

/// Log to stderr so stdout stays clean for the card or JSON output.
///
/// Installed before the config is loaded so the loader's own lines are kept.
pub fn init_logging(directive: &str) -> LogHandle {
    let (filter, handle) = reload::Layer::new(env_filter(directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

/// Replace the startup filter with the one derived from the loaded config.
pub fn apply_log_directive(handle: &LogHandle, directive: &str) {
    if let Err(e) = handle.reload(env_filter(directive)) {
        warn!("could not apply log level {directive}: {e}");
    }
}

pub fn session_config(presence: &PresenceConfig) -> SessionConfig {
    SessionConfig {
        socket_url: presence.socket_url.clone(),
        api_url: presence.api_url.clone(),
        poll_interval: Duration::from_secs(presence.poll_interval_secs.into()),
        reconnect_base_delay: Duration::from_millis(presence.reconnect_base_delay_ms.into()),
        max_retries: presence.max_retries,
        handshake_timeout: Duration::from_secs(presence.handshake_timeout_secs.into()),
        request_timeout: Duration::from_secs(presence.request_timeout_secs.into()),
    }
}
