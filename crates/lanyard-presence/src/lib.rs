//! Presence client core for the Lanyard presence service.
//!
//! A [`PresenceClient`] opens one [`PresenceSession`] per subject. Each
//! session prefers the streaming gateway, reconnects with linear backoff,
//! and degrades to REST polling for the rest of its lifetime once the
//! gateway has failed too often. Consumers receive full snapshots, errors
//! and diagnostics on separate typed channels, plus a combined
//! [`PresenceView`] through a watch channel.

pub mod diagnostics;
pub mod display;
pub mod error;
pub mod protocol;
pub mod response;
pub mod session;
pub mod snapshot;
pub mod transport;

pub use diagnostics::{Diagnostics, TransportKind};
pub use error::{ErrorKind, PresenceError, TransportError};
pub use protocol::{GatewayMessage, OpCode, PresenceData, Subscription};
pub use session::{
    PresenceClient, PresenceSession, PresenceView, SessionConfig, SessionEvents, SessionPhase,
};
pub use snapshot::{
    ActiveSurfaces, Activity, MusicSession, PresenceSnapshot, PresenceStatus, Profile,
};
pub use transport::{
    FetchResponse, HttpFetcher, PresenceFetcher, StreamConnection, StreamConnector,
    WebSocketConnector,
};
