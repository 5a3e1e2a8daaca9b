//! Error taxonomy for presence sessions.

use std::time::Duration;

use serde::Serialize;

/// Failure reported by a transport implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not even be initiated (bad URL, client setup).
    #[error("could not create connection: {0}")]
    Creation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Classification of errors delivered to session observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The service could not be reached.
    Network,
    /// A frame or body could not be understood.
    Protocol,
    /// The service answered with a well-formed error.
    Application,
    /// The subject has no tracked presence.
    NotFound,
    /// The streaming connection could not be initiated at all.
    TransportCreation,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Protocol => "WS_MESSAGE_ERROR",
            ErrorKind::Application => "API_ERROR",
            ErrorKind::NotFound => "USER_NOT_FOUND",
            ErrorKind::TransportCreation => "WS_CREATION_ERROR",
        }
    }

    /// Transient errors are worth hiding from the user while the session
    /// retries on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Network)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Network => "network error",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Application => "application error",
            ErrorKind::NotFound => "not-found error",
            ErrorKind::TransportCreation => "transport-creation error",
        })
    }
}

/// An error record with enough context for operator diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PresenceError {
    pub kind: ErrorKind,
    pub message: String,
    /// Endpoint the failing operation talked to.
    pub endpoint: String,
    /// Value of the diagnostics attempt counter when the error occurred.
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Raw payload or error context, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PresenceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: endpoint.into(),
            attempt: 0,
            status_code: None,
            details: None,
        }
    }

    pub fn at_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}
