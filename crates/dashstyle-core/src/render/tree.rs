// ── UI tree ──
//
// Plain data produced by the renderers. Adapters walk it to draw; tests
// compare it. Nothing here holds references into the store or cache.

use serde::Serialize;
use strum::Display;

use crate::admin::{AdminTab, NoticeLevel, PendingSaveState};
use crate::model::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum View {
    Main(MainView),
    Admin(AdminView),
}

// ── Main view ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainView {
    /// Document revision this view was built from.
    pub revision: u64,
    pub sections: Vec<RoomSection>,
    /// Shown instead of sections when there are no rooms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl MainView {
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.sections.iter().flat_map(|section| section.cards.iter())
    }

    pub fn card(&self, entity_id: &str) -> Option<&Card> {
        self.cards().find(|card| card.entity_id == entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSection {
    pub room_id: String,
    pub title: String,
    pub icon: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub entity_id: String,
    pub label: String,
    pub icon: String,
    pub secondary: String,
    pub active: bool,
    pub availability: Availability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable,
    NotFound,
}

// ── Admin view ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminView {
    pub tab: AdminTab,
    pub tabs: Vec<AdminTab>,
    pub rooms: Vec<RoomEditor>,
    pub add_room: AddRoomForm,
    /// Types offered by the add-entity form.
    pub entity_kinds: Vec<EntityKind>,
    pub styles: Vec<StyleField>,
    pub save: Control,
    pub discard: Control,
    pub save_state: PendingSaveState,
    pub dirty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Banner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Banner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomEditor {
    pub room_id: String,
    pub name: String,
    pub icon: String,
    pub entities: Vec<EntityRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRow {
    pub index: usize,
    pub entity_id: String,
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddRoomForm {
    pub default_icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleField {
    pub key: String,
    pub value: String,
    /// Built-in default for recognized keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub text: String,
    pub level: NoticeLevel,
}
