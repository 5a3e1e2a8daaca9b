//! Presence sessions.
//!
//! A session is a single tokio task that owns the transport state machine
//! for one subject. The public handle only holds a cancellation token, the
//! join handle and a phase watch; all observer traffic flows through
//! channels handed out at open time.

mod client;
mod driver;
mod emitter;
mod frames;
mod types;

#[cfg(test)]
mod tests;

pub use client::{PresenceClient, PresenceSession};
pub use types::{PresenceView, SessionConfig, SessionEvents, SessionPhase};
