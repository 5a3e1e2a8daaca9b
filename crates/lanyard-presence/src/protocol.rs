//! Wire protocol of the Lanyard presence service.
//!
//! The gateway speaks JSON frames of the form `{op, d, t, seq}`. The REST
//! endpoint returns `{success, data}` where `data` has the same shape as
//! the gateway's presence payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::{Activity, MusicSession, PresenceStatus, Profile};

/// Default streaming gateway.
pub const DEFAULT_SOCKET_URL: &str = "wss://api.lanyard.rest/socket";
/// Default REST base; the subject id is appended as a path segment.
pub const DEFAULT_API_URL: &str = "https://api.lanyard.rest/v1/users";

/// Event names carried by `op: 0` frames.
pub mod events {
    pub const INIT_STATE: &str = "INIT_STATE";
    pub const PRESENCE_UPDATE: &str = "PRESENCE_UPDATE";
}

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Server → client. Named event with a data payload.
    Event = 0,
    /// Server → client. Carries the heartbeat interval.
    Hello = 1,
    /// Client → server. Subscribe request.
    Initialize = 2,
    /// Client → server. Keep-alive, no payload.
    Heartbeat = 3,
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpCode::Event),
            1 => Ok(OpCode::Hello),
            2 => Ok(OpCode::Initialize),
            3 => Ok(OpCode::Heartbeat),
            other => Err(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// A gateway frame envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl GatewayMessage {
    /// `op: 2` subscribe request.
    pub fn initialize(subscription: &Subscription) -> Self {
        Self {
            op: OpCode::Initialize as u8,
            d: serde_json::to_value(subscription).ok(),
            t: None,
            seq: None,
        }
    }

    /// `op: 3` keep-alive.
    pub fn heartbeat() -> Self {
        Self {
            op: OpCode::Heartbeat as u8,
            d: None,
            t: None,
            seq: None,
        }
    }

    pub fn opcode(&self) -> Result<OpCode, u8> {
        OpCode::try_from(self.op)
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"op\":{}}}", self.op))
    }
}

/// Payload of `op: 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Milliseconds between client heartbeats.
    pub heartbeat_interval: u64,
}

/// Payload of `op: 2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subscription {
    One { subscribe_to_id: String },
    Many { subscribe_to_ids: Vec<String> },
    All { subscribe_to_all: bool },
}

impl Subscription {
    pub fn one(id: impl Into<String>) -> Self {
        Subscription::One {
            subscribe_to_id: id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presence payload
// ---------------------------------------------------------------------------

/// Presence payload as delivered by both the gateway and the REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceData {
    pub discord_user: Profile,
    pub discord_status: PresenceStatus,
    #[serde(default)]
    pub active_on_discord_desktop: bool,
    #[serde(default)]
    pub active_on_discord_mobile: bool,
    #[serde(default)]
    pub listening_to_spotify: bool,
    #[serde(default)]
    pub spotify: Option<MusicSession>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub kv: BTreeMap<String, String>,
}
