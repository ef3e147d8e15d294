// ── Wire document conversion ──
//
// Documents stored by the host were written by older dashboards and by
// hand, so decoding is lenient: anything salvageable is kept, broken
// entries are dropped with a warning, and the result always satisfies the
// document invariants (unique room ids, valid and unique entity ids per
// room, non-empty room names). Only a document whose shape is unusable at
// the top level is a decode error.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::CoreError;
use crate::model::{
    Configuration, DEFAULT_ROOM_ICON, EntityId, EntityKind, EntityRef, Room, RoomId, Styles,
    default_styles,
};

pub const UNNAMED_ROOM: &str = "Unnamed room";

/// Decode a stored document. `null` (nothing saved yet) yields the
/// built-in default document.
pub fn decode_configuration(value: Value) -> Result<Configuration, CoreError> {
    let mut top = match value {
        Value::Null => return Ok(Configuration::default()),
        Value::Object(map) => map,
        other => {
            return Err(CoreError::Decode {
                message: format!("expected a configuration object, got {}", type_name(&other)),
            });
        }
    };

    let rooms = match top.remove("rooms") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rooms)) => decode_rooms(rooms),
        Some(other) => {
            return Err(CoreError::Decode {
                message: format!("'rooms' must be an array, got {}", type_name(&other)),
            });
        }
    };

    let styles = match top.remove("styles") {
        None | Some(Value::Null) => default_styles(),
        Some(Value::Object(styles)) => decode_styles(styles),
        Some(other) => {
            warn!(found = type_name(&other), "ignoring non-object styles, using defaults");
            default_styles()
        }
    };

    Ok(Configuration {
        rooms,
        styles,
        extra: top,
    })
}

/// Encode for `dashstyle/config/save`.
pub fn encode_configuration(doc: &Configuration) -> Result<Value, CoreError> {
    serde_json::to_value(doc).map_err(|e| CoreError::Decode {
        message: format!("failed to encode configuration: {e}"),
    })
}

fn decode_rooms(raw: Vec<Value>) -> Vec<Room> {
    let mut seen = HashSet::new();
    let mut rooms = Vec::with_capacity(raw.len());

    for (position, value) in raw.into_iter().enumerate() {
        let Value::Object(mut room) = value else {
            warn!(position, "dropping room that is not an object");
            continue;
        };

        let id = match take_string(&mut room, "id") {
            Some(id) if !seen.contains(&id) => RoomId::from(id),
            Some(id) => {
                let fresh = RoomId::generate();
                warn!(duplicate = %id, room_id = %fresh, "room id repeated, assigned a new one");
                fresh
            }
            None => {
                let fresh = RoomId::generate();
                warn!(position, room_id = %fresh, "room without id, assigned one");
                fresh
            }
        };
        seen.insert(id.as_str().to_owned());

        let name = take_string(&mut room, "name")
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNNAMED_ROOM.to_owned());
        let icon = take_string(&mut room, "icon")
            .filter(|icon| !icon.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM_ICON.to_owned());

        let entities = match room.remove("entities") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entities)) => decode_entities(&id, entities),
            Some(_) => {
                warn!(room_id = %id, "room entities are not an array, dropping them");
                Vec::new()
            }
        };

        rooms.push(Room {
            id,
            name,
            icon,
            entities,
        });
    }

    rooms
}

fn decode_entities(room_id: &RoomId, raw: Vec<Value>) -> Vec<EntityRef> {
    let mut entities: Vec<EntityRef> = Vec::with_capacity(raw.len());

    for value in raw {
        let Value::Object(mut entity) = value else {
            warn!(room_id = %room_id, "dropping entity reference that is not an object");
            continue;
        };

        let raw_id = take_string(&mut entity, "id").unwrap_or_default();
        let id = match EntityId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(room_id = %room_id, entity_id = %raw_id, error = %e, "dropping entity reference");
                continue;
            }
        };

        let raw_kind = take_string(&mut entity, "type").unwrap_or_default();
        let Ok(kind) = raw_kind.parse::<EntityKind>() else {
            warn!(room_id = %room_id, entity_id = %id, kind = %raw_kind, "dropping entity reference of unknown type");
            continue;
        };

        if entities.iter().any(|existing| existing.id == id) {
            warn!(room_id = %room_id, entity_id = %id, "dropping duplicate entity reference");
            continue;
        }

        let subtype = take_string(&mut entity, "subtype").filter(|s| !s.trim().is_empty());
        entities.push(EntityRef { id, kind, subtype });
    }

    entities
}

fn decode_styles(raw: Map<String, Value>) -> Styles {
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn null_decodes_to_default_document() {
        assert_eq!(decode_configuration(Value::Null).unwrap(), Configuration::default());
    }

    #[test]
    fn non_object_and_bad_rooms_are_decode_errors() {
        assert!(matches!(
            decode_configuration(json!([1, 2])),
            Err(CoreError::Decode { .. })
        ));
        assert!(matches!(
            decode_configuration(json!({ "rooms": "kitchen" })),
            Err(CoreError::Decode { .. })
        ));
    }

    #[test]
    fn repairs_rooms_and_drops_broken_entities() {
        let doc = decode_configuration(json!({
            "rooms": [
                {
                    "id": "room_a",
                    "name": "Kitchen",
                    "icon": "mdi:chef-hat",
                    "entities": [
                        { "id": "light.kitchen_main", "type": "light" },
                        { "id": "light.kitchen_main", "type": "light" },
                        { "id": "Not Valid", "type": "light" },
                        { "id": "vacuum.robo", "type": "vacuum" },
                        { "id": "sensor.temp", "type": "sensor", "subtype": "" }
                    ]
                },
                { "id": "room_a", "name": "   " },
                { "name": "Garage", "icon": "" },
                "garbage"
            ]
        }))
        .unwrap();

        assert_eq!(doc.rooms.len(), 3);

        let kitchen = &doc.rooms[0];
        assert_eq!(kitchen.id.as_str(), "room_a");
        let ids: Vec<&str> = kitchen.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["light.kitchen_main", "sensor.temp"]);
        assert_eq!(kitchen.entities[1].subtype, None);

        let renamed = &doc.rooms[1];
        assert_ne!(renamed.id.as_str(), "room_a");
        assert_eq!(renamed.name, UNNAMED_ROOM);

        let garage = &doc.rooms[2];
        assert!(garage.id.as_str().starts_with("room_"));
        assert_eq!(garage.icon, DEFAULT_ROOM_ICON);
    }

    #[test]
    fn styles_are_stringified_and_extra_keys_kept() {
        let doc = decode_configuration(json!({
            "rooms": [],
            "styles": { "primary-color": "#123456", "card-radius": 12 },
            "layout": { "columns": 2 }
        }))
        .unwrap();

        assert_eq!(doc.styles["primary-color"], "#123456");
        assert_eq!(doc.styles["card-radius"], "12");
        assert!(!doc.styles.contains_key("accent-color"));
        assert_eq!(doc.extra["layout"], json!({ "columns": 2 }));

        let encoded = encode_configuration(&doc).unwrap();
        assert_eq!(encoded["layout"]["columns"], 2);
        assert_eq!(decode_configuration(encoded).unwrap(), doc);
    }

    #[test]
    fn missing_styles_fall_back_to_defaults() {
        let doc = decode_configuration(json!({ "rooms": [] })).unwrap();
        assert_eq!(doc.styles, default_styles());
    }
}
