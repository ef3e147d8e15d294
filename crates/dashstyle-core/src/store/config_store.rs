// ── ConfigStore ──
//
// Owns the editable configuration document and the baseline (the copy last
// known to match what the host persisted). Every mutator is synchronous,
// performs no I/O, and either succeeds completely or leaves both the
// document and the revision untouched.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Configuration, DEFAULT_ROOM_ICON, EntityId, EntityKind, EntityRef, Room, RoomId};

#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: Configuration,
    baseline: Configuration,
    revision: u64,
    last_saved_at: Option<DateTime<Utc>>,
}

impl ConfigStore {
    /// A store holding the built-in default document as both current and
    /// baseline.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn document(&self) -> &Configuration {
        &self.current
    }

    pub fn baseline(&self) -> &Configuration {
        &self.baseline
    }

    /// Bumped by every successful mutation or load.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.baseline
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.current.room(room_id)
    }

    // ── Loading and saving ───────────────────────────────────────────

    /// Replace the whole document and make it the baseline.
    pub fn load(&mut self, doc: Configuration) {
        self.baseline = doc.clone();
        self.current = doc;
        self.bump();
    }

    /// Record `doc` as persisted. The current document is not touched, so
    /// edits made while the save was in flight stay dirty.
    pub fn mark_saved(&mut self, doc: Configuration) {
        self.baseline = doc;
        self.last_saved_at = Some(Utc::now());
    }

    /// Replace only the baseline, keeping local edits.
    pub fn rebase(&mut self, doc: Configuration) {
        self.baseline = doc;
    }

    /// Replace the document with the built-in default. The baseline is
    /// kept, so the reset shows as unsaved.
    pub fn reset_to_defaults(&mut self) {
        self.current = Configuration::default();
        self.bump();
    }

    // ── Rooms ────────────────────────────────────────────────────────

    /// Append a room and return its freshly generated id.
    pub fn add_room(&mut self, name: &str, icon: &str) -> Result<RoomId, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Room name is required"));
        }
        let icon = match icon.trim() {
            "" => DEFAULT_ROOM_ICON,
            icon => icon,
        };

        let mut id = RoomId::generate();
        while self.current.room(id.as_str()).is_some() {
            id = RoomId::generate();
        }

        self.current.rooms.push(Room {
            id: id.clone(),
            name: name.to_owned(),
            icon: icon.to_owned(),
            entities: Vec::new(),
        });
        self.bump();
        debug!(room_id = %id, revision = self.revision, "room added");
        Ok(id)
    }

    /// Remove a room and, with it, all its entity references.
    pub fn delete_room(&mut self, room_id: &str) -> Result<Room, CoreError> {
        let position = self
            .current
            .rooms
            .iter()
            .position(|room| room.id.as_str() == room_id)
            .ok_or_else(|| CoreError::room_not_found(room_id))?;

        let removed = self.current.rooms.remove(position);
        self.bump();
        debug!(room_id, revision = self.revision, "room deleted");
        Ok(removed)
    }

    // ── Entities ─────────────────────────────────────────────────────

    pub fn add_entity(
        &mut self,
        room_id: &str,
        entity_id: &str,
        kind: EntityKind,
        subtype: Option<&str>,
    ) -> Result<(), CoreError> {
        let room = self
            .current
            .room_mut(room_id)
            .ok_or_else(|| CoreError::room_not_found(room_id))?;

        let id = EntityId::parse(entity_id).map_err(|e| CoreError::validation(e.to_string()))?;
        if room.contains(&id) {
            return Err(CoreError::Duplicate {
                entity_id: id.to_string(),
                room: room.name.clone(),
            });
        }

        let subtype = subtype
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);
        debug!(room_id, entity_id = %id, "entity added");
        room.entities.push(EntityRef { id, kind, subtype });
        self.bump();
        Ok(())
    }

    pub fn remove_entity(&mut self, room_id: &str, index: usize) -> Result<EntityRef, CoreError> {
        let room = self
            .current
            .room_mut(room_id)
            .ok_or_else(|| CoreError::room_not_found(room_id))?;

        if index >= room.entities.len() {
            return Err(CoreError::Index {
                room_id: room_id.to_owned(),
                index,
                len: room.entities.len(),
            });
        }

        let removed = room.entities.remove(index);
        debug!(room_id, entity_id = %removed.id, "entity removed");
        self.bump();
        Ok(removed)
    }

    // ── Styles ───────────────────────────────────────────────────────

    /// Set a style value. Unknown keys are stored as-is.
    pub fn set_style(&mut self, key: &str, value: &str) {
        self.current
            .styles
            .insert(key.to_owned(), value.to_owned());
        self.bump();
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
