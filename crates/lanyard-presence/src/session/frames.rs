//! Decoding of inbound gateway frames.

use std::time::Duration;

use serde_json::Value;

use crate::protocol::{events, GatewayMessage, HelloPayload, OpCode, PresenceData};

/// A frame the driver knows how to act on.
#[derive(Debug)]
pub(crate) enum Inbound {
    Hello { heartbeat_interval: Duration },
    Presence { event: String, data: Box<PresenceData> },
    /// A presence event whose payload is null: the subject is not tracked.
    Missing { event: String },
    /// Well-formed but irrelevant, e.g. an event name we do not handle.
    Ignored { event: Option<String> },
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unexpected opcode {0}")]
    UnexpectedOp(u8),
}

/// Parse one text frame. The raw JSON is returned even when the frame is
/// rejected further down, so it can be recorded in diagnostics.
pub(crate) fn decode(text: &str) -> (Option<Value>, Result<Inbound, FrameError>) {
    let raw: Value = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(e) => return (None, Err(FrameError::Malformed(e.to_string()))),
    };
    let outcome = interpret(raw.clone());
    (Some(raw), outcome)
}

fn interpret(raw: Value) -> Result<Inbound, FrameError> {
    let msg: GatewayMessage =
        serde_json::from_value(raw).map_err(|e| FrameError::Malformed(e.to_string()))?;

    match msg.opcode().map_err(FrameError::UnexpectedOp)? {
        OpCode::Hello => {
            let payload: HelloPayload = msg
                .d
                .ok_or_else(|| FrameError::Malformed("hello without payload".into()))
                .and_then(|d| {
                    serde_json::from_value(d).map_err(|e| FrameError::Malformed(e.to_string()))
                })?;
            if payload.heartbeat_interval == 0 {
                return Err(FrameError::Malformed("zero heartbeat interval".into()));
            }
            Ok(Inbound::Hello {
                heartbeat_interval: Duration::from_millis(payload.heartbeat_interval),
            })
        }
        OpCode::Event => {
            let event = match msg.t.as_deref() {
                Some(t @ (events::INIT_STATE | events::PRESENCE_UPDATE)) => t.to_string(),
                _ => return Ok(Inbound::Ignored { event: msg.t }),
            };
            match msg.d {
                None | Some(Value::Null) => Ok(Inbound::Missing { event }),
                Some(d) => serde_json::from_value::<PresenceData>(d)
                    .map(|data| Inbound::Presence {
                        event,
                        data: Box::new(data),
                    })
                    .map_err(|e| FrameError::Malformed(e.to_string())),
            }
        }
        // Client-to-server opcodes are never valid inbound.
        op @ (OpCode::Initialize | OpCode::Heartbeat) => Err(FrameError::UnexpectedOp(op as u8)),
    }
}
