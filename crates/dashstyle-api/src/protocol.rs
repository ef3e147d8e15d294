//! Home Assistant WebSocket message shapes.
//!
//! Only the subset the dashboard needs is modeled: the auth handshake,
//! command results, `state_changed` events and pongs. Anything else the
//! host sends decodes to [`Inbound::Unknown`] and is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

// ── Host entity state ────────────────────────────────────────────────

/// One entity's state as reported by the host (`get_states`, REST
/// `/api/states`, or the `new_state` of a `state_changed` event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,
}

/// Full snapshot keyed by entity id.
pub type StateMap = HashMap<String, HostState>;

// ── Inbound frames ───────────────────────────────────────────────────

/// Error object carried by a failed `result` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A frame received from the host, discriminated by its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        id: u64,
        success: bool,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<RpcError>,
    },
    Event {
        id: u64,
        event: Value,
    },
    Pong {
        id: u64,
    },
    #[serde(other)]
    Unknown,
}

impl Inbound {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ── state_changed ────────────────────────────────────────────────────

/// Payload of a `state_changed` event. A `None` new state means the
/// entity was removed from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub entity_id: String,
    pub new_state: Option<HostState>,
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    event_type: Option<String>,
    data: StateChangedData,
}

#[derive(Deserialize)]
struct StateChangedData {
    entity_id: String,
    #[serde(default)]
    new_state: Option<HostState>,
}

impl StateChange {
    /// Extract a state change from the `event` member of an event frame.
    ///
    /// Returns `None` for other event types or payloads that do not carry
    /// an entity id.
    pub fn from_event(event: &Value) -> Option<Self> {
        let envelope: EventEnvelope = serde_json::from_value(event.clone()).ok()?;
        if envelope
            .event_type
            .as_deref()
            .is_some_and(|kind| kind != "state_changed")
        {
            return None;
        }
        Some(Self {
            entity_id: envelope.data.entity_id,
            new_state: envelope.data.new_state,
        })
    }
}

/// Apply one change to a full snapshot. Removals drop the key.
pub fn apply_state_change(map: &mut StateMap, change: StateChange) {
    match change.new_state {
        Some(state) => {
            map.insert(change.entity_id, state);
        }
        None => {
            map.remove(&change.entity_id);
        }
    }
}

// ── Outbound frames ──────────────────────────────────────────────────

/// The first message after `auth_required`.
pub fn auth_message(access_token: &str) -> String {
    json!({ "type": "auth", "access_token": access_token }).to_string()
}

/// Build a command frame. `payload` must be an object (or null); its
/// members are merged next to `id` and `type`.
pub fn command(id: u64, kind: &str, payload: Value) -> String {
    let mut frame = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    frame.insert("id".into(), Value::from(id));
    frame.insert("type".into(), Value::from(kind));
    Value::Object(frame).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_handshake_frames() {
        assert!(matches!(
            Inbound::parse(r#"{"type":"auth_required","ha_version":"2024.1.0"}"#).unwrap(),
            Inbound::AuthRequired { .. }
        ));
        assert!(matches!(
            Inbound::parse(r#"{"type":"auth_invalid","message":"Invalid password"}"#).unwrap(),
            Inbound::AuthInvalid { message: Some(m) } if m == "Invalid password"
        ));
    }

    #[test]
    fn parses_failed_result() {
        let frame = r#"{"id":3,"type":"result","success":false,"error":{"code":"unknown_command","message":"Unknown command."}}"#;
        match Inbound::parse(frame).unwrap() {
            Inbound::Result {
                id, success, error, ..
            } => {
                assert_eq!(id, 3);
                assert!(!success);
                assert_eq!(error.unwrap().code, "unknown_command");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unknown_frame_types_are_tolerated() {
        assert!(matches!(
            Inbound::parse(r#"{"type":"supported_features","id":1}"#).unwrap(),
            Inbound::Unknown
        ));
    }

    #[test]
    fn state_change_with_null_new_state_removes_entity() {
        let mut map = StateMap::new();
        map.insert(
            "light.kitchen".into(),
            HostState {
                entity_id: "light.kitchen".into(),
                state: "on".into(),
                attributes: Map::new(),
                last_changed: None,
            },
        );
        let event = json!({
            "event_type": "state_changed",
            "data": { "entity_id": "light.kitchen", "new_state": null }
        });
        let change = StateChange::from_event(&event).unwrap();
        apply_state_change(&mut map, change);
        assert!(map.is_empty());
    }

    #[test]
    fn state_change_inserts_new_state() {
        let mut map = StateMap::new();
        let event = json!({
            "event_type": "state_changed",
            "data": {
                "entity_id": "sensor.temp",
                "new_state": {
                    "entity_id": "sensor.temp",
                    "state": "21.5",
                    "attributes": { "unit_of_measurement": "°C" }
                }
            }
        });
        apply_state_change(&mut map, StateChange::from_event(&event).unwrap());
        assert_eq!(map["sensor.temp"].state, "21.5");
    }

    #[test]
    fn other_event_types_are_skipped() {
        let event = json!({ "event_type": "call_service", "data": { "domain": "light" } });
        assert!(StateChange::from_event(&event).is_none());
    }

    #[test]
    fn command_merges_payload() {
        let frame: Value = serde_json::from_str(&command(
            7,
            "call_service",
            json!({ "domain": "light", "service": "toggle" }),
        ))
        .unwrap();
        assert_eq!(frame["id"], 7);
        assert_eq!(frame["type"], "call_service");
        assert_eq!(frame["domain"], "light");
    }
}
