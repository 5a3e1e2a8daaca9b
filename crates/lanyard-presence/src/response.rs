//! Interpretation of REST responses.
//!
//! A usable response carries `success: true` and a non-empty `data`
//! object. Anything else becomes an error record; it never yields an
//! empty snapshot. Only a body that is not JSON at all is a protocol
//! error; a JSON body the service sent with the wrong shape is an
//! application error.

use serde_json::{json, Value};

use crate::error::{ErrorKind, PresenceError};
use crate::protocol::PresenceData;
use crate::snapshot::PresenceSnapshot;
use crate::transport::FetchResponse;

/// Error code the service uses for subjects it does not track.
const NOT_MONITORED: &str = "user_not_monitored";

/// Classify a fetched response.
///
/// Returns the parsed body (for diagnostics) alongside the outcome. A body
/// that is not JSON is returned as a JSON string.
pub fn interpret(endpoint: &str, response: &FetchResponse) -> (Value, Result<PresenceSnapshot, PresenceError>) {
    let body: Value = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(e) => {
            let raw = Value::String(response.body.clone());
            let err = PresenceError::new(
                ErrorKind::Protocol,
                format!("Invalid response body: {e}"),
                endpoint,
            )
            .with_status(response.status)
            .with_details(raw.clone());
            return (raw, Err(err));
        }
    };

    let outcome = classify(endpoint, response.status, &body);
    (body, outcome)
}

fn classify(endpoint: &str, status: u16, body: &Value) -> Result<PresenceSnapshot, PresenceError> {
    let service_code = body
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str);

    if service_code == Some(NOT_MONITORED) {
        return Err(not_found(endpoint, body));
    }

    if !(200..300).contains(&status) {
        let message = service_message(body).unwrap_or_else(|| format!("HTTP Error: {status}"));
        return Err(PresenceError::new(ErrorKind::Application, message, endpoint)
            .with_status(status)
            .with_details(body.clone()));
    }

    if body.get("success").and_then(Value::as_bool) != Some(true) {
        let message = service_message(body)
            .unwrap_or_else(|| "API Error: Request was not successful".to_string());
        return Err(PresenceError::new(ErrorKind::Application, message, endpoint)
            .with_status(status)
            .with_details(body.clone()));
    }

    let data = match body.get("data") {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map.clone()),
        _ => return Err(not_found(endpoint, body)),
    };

    serde_json::from_value::<PresenceData>(data)
        .map(PresenceSnapshot::from)
        .map_err(|e| {
            PresenceError::new(
                ErrorKind::Application,
                format!("API Error: Unexpected presence payload: {e}"),
                endpoint,
            )
            .with_status(status)
            .with_details(body.clone())
        })
}

fn service_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn not_found(endpoint: &str, body: &Value) -> PresenceError {
    PresenceError::new(ErrorKind::NotFound, "User Not Found", endpoint)
        .with_details(json!({ "response": body }))
}
