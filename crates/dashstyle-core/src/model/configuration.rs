// ── Dashboard document ──
//
// The configuration the admin edits and the host persists: an ordered list
// of rooms, each holding entity references, plus a flat style mapping.
// Top-level keys this version does not know about ride along in `extra`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use super::entity_id::EntityId;

pub const DEFAULT_ROOM_ICON: &str = "mdi:home";

/// Style key → value. Ordered so rendering and saving are deterministic.
pub type Styles = BTreeMap<String, String>;

/// Recognized style keys with their built-in defaults, in form order.
pub const STYLE_DEFAULTS: [(&str, &str); 3] = [
    ("primary-color", "#03a9f4"),
    ("accent-color", "#ff9800"),
    ("primary-font-family", "Arial, sans-serif"),
];

pub fn default_styles() -> Styles {
    STYLE_DEFAULTS
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

pub fn is_recognized_style(key: &str) -> bool {
    STYLE_DEFAULTS.iter().any(|(known, _)| *known == key)
}

// ── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub rooms: Vec<Room>,
    pub styles: Styles,
    /// Unknown top-level keys (e.g. a legacy `layout` section), written
    /// back unchanged on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Configuration {
    /// The built-in document: no rooms, default styles.
    fn default() -> Self {
        Self {
            rooms: Vec::new(),
            styles: default_styles(),
            extra: Map::new(),
        }
    }
}

impl Configuration {
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id.as_str() == id)
    }

    pub fn room_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| room.id.as_str() == id)
    }

    pub fn entity_count(&self) -> usize {
        self.rooms.iter().map(|room| room.entities.len()).sum()
    }
}

// ── Room ────────────────────────────────────────────────────────────

/// Opaque room identifier, `room_<uuid>`. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn generate() -> Self {
        Self(format!("room_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub entities: Vec<EntityRef>,
}

impl Room {
    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.entities.iter().any(|entity| &entity.id == entity_id)
    }
}

// ── EntityRef ───────────────────────────────────────────────────────

/// A room's reference to one host entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

/// Entity types selectable in the admin form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Light,
    Cover,
    Sensor,
    MediaPlayer,
    Scene,
    Switch,
}
