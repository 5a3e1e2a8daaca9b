use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::diagnostics::Diagnostics;
use crate::error::PresenceError;
use crate::protocol::{DEFAULT_API_URL, DEFAULT_SOCKET_URL};
use crate::snapshot::PresenceSnapshot;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables of a presence session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Streaming gateway. Empty disables streaming.
    pub socket_url: String,
    /// REST base; the subject id is appended.
    pub api_url: String,
    pub poll_interval: Duration,
    pub reconnect_base_delay: Duration,
    /// Consecutive streaming failures tolerated before falling back to polling.
    pub max_retries: u32,
    /// How long a fresh connection may take to deliver Hello.
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_base_delay: DEFAULT_RECONNECT_BASE_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Linear backoff: the n-th reconnect (0-based) waits `base * (n + 1)`.
    pub fn reconnect_delay(&self, retry: u32) -> Duration {
        self.reconnect_base_delay.saturating_mul(retry.saturating_add(1))
    }

    pub fn streaming_supported(&self) -> bool {
        !self.socket_url.trim().is_empty()
    }
}

/// Where the session's state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    StreamingConnecting,
    /// Hello received; heartbeats running.
    StreamingActive,
    StreamingReconnecting { retry: u32, delay: Duration },
    PollingActive,
    Closed,
}

impl SessionPhase {
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            SessionPhase::StreamingConnecting
                | SessionPhase::StreamingActive
                | SessionPhase::StreamingReconnecting { .. }
        )
    }
}

/// Combined state for consumers that just want "what to show now".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceView {
    pub snapshot: Option<PresenceSnapshot>,
    /// True until the first snapshot or fetch outcome.
    pub loading: bool,
    /// Last reported error; cleared by the next snapshot.
    pub error: Option<PresenceError>,
    pub diagnostics: Diagnostics,
}

impl PresenceView {
    pub(crate) fn initial(diagnostics: Diagnostics) -> Self {
        Self {
            snapshot: None,
            loading: true,
            error: None,
            diagnostics,
        }
    }
}

/// Receiving ends of a session's observer channels.
///
/// Dropping a receiver unsubscribes from that kind of event only.
#[derive(Debug)]
pub struct SessionEvents {
    pub snapshots: mpsc::UnboundedReceiver<PresenceSnapshot>,
    pub errors: mpsc::UnboundedReceiver<PresenceError>,
    pub diagnostics: mpsc::UnboundedReceiver<Diagnostics>,
    pub view: watch::Receiver<PresenceView>,
}
