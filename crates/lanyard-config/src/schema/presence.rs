//! Presence transport configuration.

use serde::{Deserialize, Serialize};

/// Where and how the client talks to the presence service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// WebSocket gateway URL.
    pub socket_url: String,
    /// REST base URL; the subject id is appended as a path segment.
    pub api_url: String,
    /// Try the streaming gateway before falling back to polling.
    pub prefer_streaming: bool,
    /// Polling period in seconds (valid range: 5-3600).
    pub poll_interval_secs: u32,
    /// Base reconnect delay in milliseconds; grows linearly per retry.
    pub reconnect_base_delay_ms: u32,
    /// Streaming failures tolerated before switching to polling for good.
    pub max_retries: u32,
    /// Time allowed from connect to `Hello`, in seconds.
    pub handshake_timeout_secs: u32,
    /// Per-request timeout for REST fetches, in seconds.
    pub request_timeout_secs: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            socket_url: "wss://api.lanyard.rest/socket".into(),
            api_url: "https://api.lanyard.rest/v1/users".into(),
            prefer_streaming: true,
            poll_interval_secs: 30,
            reconnect_base_delay_ms: 2000,
            max_retries: 3,
            handshake_timeout_secs: 15,
            request_timeout_secs: 10,
        }
    }
}
