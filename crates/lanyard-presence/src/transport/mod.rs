//! Transport seams used by presence sessions.
//!
//! Sessions only see these traits, so the state machine can be driven by
//! the real WebSocket/HTTP implementations or by in-memory ones.

mod http;
mod websocket;

use async_trait::async_trait;
use lanyard_common::SubjectId;

use crate::error::TransportError;

pub use http::HttpFetcher;
pub use websocket::WebSocketConnector;

/// Opens streaming connections.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamConnection>, TransportError>;
}

/// One open, message-oriented connection.
#[async_trait]
pub trait StreamConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Next text frame. `None` once the peer has closed the connection.
    ///
    /// Must be cancel-safe: it is raced against timers.
    async fn next_text(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self);
}

/// Raw result of one REST fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Fetches presence for one subject over REST.
#[async_trait]
pub trait PresenceFetcher: Send + Sync {
    /// URL a fetch for `subject` will hit.
    fn endpoint(&self, subject: &SubjectId) -> String;

    async fn fetch(&self, subject: &SubjectId) -> Result<FetchResponse, TransportError>;
}
