//! Operator-facing connection metadata. Process-local, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which transport a session is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    #[serde(rename = "websocket")]
    Streaming,
    #[serde(rename = "rest")]
    Polling,
}

impl TransportKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::Streaming => "websocket",
            TransportKind::Polling => "rest",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub last_attempt: DateTime<Utc>,
    #[serde(rename = "connectionType")]
    pub transport: TransportKind,
    /// Cumulative connection and fetch attempts over the session.
    pub attempts: u32,
    pub last_endpoint: String,
    /// Last raw payload received. Unbounded; truncate before display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_response: Option<serde_json::Value>,
}

impl Diagnostics {
    pub fn new(transport: TransportKind, endpoint: impl Into<String>) -> Self {
        Self {
            last_attempt: Utc::now(),
            transport,
            attempts: 0,
            last_endpoint: endpoint.into(),
            last_response: None,
        }
    }

    /// Count a new attempt and return the updated counter.
    pub(crate) fn record_attempt(&mut self, transport: TransportKind, endpoint: &str) -> u32 {
        self.last_attempt = Utc::now();
        self.transport = transport;
        self.attempts += 1;
        self.last_endpoint = endpoint.to_string();
        self.attempts
    }

    pub(crate) fn record_response(&mut self, raw: serde_json::Value) {
        self.last_response = Some(raw);
    }

    /// The last response as compact JSON, cut to `limit` characters.
    pub fn response_preview(&self, limit: usize) -> Option<String> {
        let raw = self.last_response.as_ref()?;
        let text = match raw {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if text.chars().count() <= limit {
            return Some(text);
        }
        let mut cut: String = text.chars().take(limit).collect();
        cut.push('…');
        Some(cut)
    }
}
