//! Validation for the `[presence]` section.

use crate::schema::LanyardConfig;

use super::helpers::{validate_range, validate_scheme};

pub(crate) fn validate_presence(errors: &mut Vec<String>, config: &LanyardConfig) {
    let presence = &config.presence;

    validate_scheme(errors, "presence.socket_url", &presence.socket_url, &["ws", "wss"]);
    validate_scheme(errors, "presence.api_url", &presence.api_url, &["http", "https"]);
    validate_range(
        errors,
        "presence.poll_interval_secs",
        presence.poll_interval_secs,
        5,
        3600,
    );
    validate_range(
        errors,
        "presence.reconnect_base_delay_ms",
        presence.reconnect_base_delay_ms,
        100,
        60_000,
    );
    validate_range(errors, "presence.max_retries", presence.max_retries, 0, 10);
    validate_range(
        errors,
        "presence.handshake_timeout_secs",
        presence.handshake_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "presence.request_timeout_secs",
        presence.request_timeout_secs,
        1,
        120,
    );
}
