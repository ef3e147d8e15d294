// ── AdminController ──
//
// Turns discrete admin actions into ConfigStore calls and owns the admin
// view's UI state: the selected tab, the save workflow, transient notices
// and the gateway status banner. Local edit failures never escape as
// errors; they become error notices and the document is left untouched.

use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::DashboardOptions;
use crate::error::CoreError;
use crate::model::{Configuration, EntityKind};
use crate::store::ConfigStore;

pub const NOTHING_TO_DISCARD: &str = "Nothing to discard";
pub const SAVE_SUCCEEDED: &str = "Configuration saved successfully!";
pub const LOAD_FAILED: &str = "Error loading configuration.";
pub const DISCARDED: &str = "Unsaved changes discarded";

// ── UI state types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdminTab {
    #[default]
    Rooms,
    Styling,
}

/// Governs the save control and the save status text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PendingSaveState {
    #[default]
    Idle,
    Saving,
    Error(String),
}

impl PendingSaveState {
    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient message that disappears at `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub expires_at: Instant,
}

/// Expiry used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            text: text.into(),
            level,
            expires_at: now
                .checked_add(ttl)
                .unwrap_or_else(|| now + FAR_FUTURE),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Everything the admin view shows that is not part of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUi {
    pub tab: AdminTab,
    pub save_state: PendingSaveState,
    pub notice: Option<Notice>,
    pub status: Option<Notice>,
}

// ── Confirmation capability ─────────────────────────────────────────

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

// ── Actions and outcomes ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    AddRoom {
        name: String,
        icon: String,
    },
    DeleteRoom {
        room_id: String,
    },
    AddEntity {
        room_id: String,
        entity_id: String,
        kind: EntityKind,
        subtype: Option<String>,
    },
    RemoveEntity {
        room_id: String,
        index: usize,
    },
    SetStyle {
        key: String,
        value: String,
    },
    ResetToDefaults,
}

#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The document changed; the admin view must re-render.
    Applied,
    /// The user declined the confirmation. Nothing changed.
    Declined,
    /// A local validation failure, already posted as a notice.
    Rejected(CoreError),
}

impl ActionOutcome {
    pub fn needs_render(&self) -> bool {
        !matches!(self, Self::Declined)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    /// A save was started for this document.
    Started(Configuration),
    /// A save is already outstanding; nothing was sent.
    AlreadyInFlight,
    /// The admin flag is not set.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardRequest {
    Proceed,
    NothingToDiscard,
    Declined,
    /// The admin flag is not set.
    Denied,
}

// ── Controller ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AdminController {
    ui: AdminUi,
    notice_ttl: Duration,
    status_ttl: Duration,
}

impl AdminController {
    pub fn new(options: &DashboardOptions) -> Self {
        Self {
            ui: AdminUi::default(),
            notice_ttl: options.notice_ttl,
            status_ttl: options.status_ttl,
        }
    }

    pub fn ui(&self) -> &AdminUi {
        &self.ui
    }

    pub fn save_state(&self) -> &PendingSaveState {
        &self.ui.save_state
    }

    /// Switch the admin tab. Tabs are view state, never a document edit.
    pub fn select_tab(&mut self, tab: AdminTab) -> bool {
        let changed = self.ui.tab != tab;
        self.ui.tab = tab;
        changed
    }

    /// Apply one admin action to the store.
    pub fn apply(
        &mut self,
        store: &mut ConfigStore,
        action: AdminAction,
        confirm: &dyn Confirm,
    ) -> ActionOutcome {
        if let Some(question) = confirmation_for(store, &action) {
            if !confirm.confirm(&question) {
                debug!(?action, "admin action declined");
                return ActionOutcome::Declined;
            }
        }

        match execute(store, action) {
            Ok(message) => {
                debug!(revision = store.revision(), %message, "admin action applied");
                self.notify(NoticeLevel::Success, message);
                ActionOutcome::Applied
            }
            Err(e) => {
                debug!(error = %e, "admin action rejected");
                self.notify(NoticeLevel::Error, e.to_string());
                ActionOutcome::Rejected(e)
            }
        }
    }

    // ── Save ─────────────────────────────────────────────────────────

    /// Start a save unless one is already outstanding.
    pub fn begin_save(&mut self, store: &ConfigStore) -> SaveRequest {
        if self.ui.save_state.is_saving() {
            return SaveRequest::AlreadyInFlight;
        }
        self.ui.save_state = PendingSaveState::Saving;
        SaveRequest::Started(store.document().clone())
    }

    /// Apply a save completion. On success the saved document becomes the
    /// baseline; on failure the edits stay and the error is kept for
    /// display.
    pub fn finish_save(
        &mut self,
        store: &mut ConfigStore,
        document: Configuration,
        result: Result<(), CoreError>,
    ) -> Result<(), String> {
        match result {
            Ok(()) => {
                info!(rooms = document.rooms.len(), "configuration saved");
                store.mark_saved(document);
                self.ui.save_state = PendingSaveState::Idle;
                self.post_status(NoticeLevel::Success, SAVE_SUCCEEDED);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "configuration save failed");
                self.ui.save_state = PendingSaveState::Error(message.clone());
                self.post_status(
                    NoticeLevel::Error,
                    format!("Error saving configuration: {message}"),
                );
                Err(message)
            }
        }
    }

    // ── Discard and load ─────────────────────────────────────────────

    pub fn request_discard(&mut self, store: &ConfigStore, confirm: &dyn Confirm) -> DiscardRequest {
        if !store.is_dirty() {
            self.notify(NoticeLevel::Info, NOTHING_TO_DISCARD);
            return DiscardRequest::NothingToDiscard;
        }
        if !confirm.confirm("Discard all unsaved changes?") {
            return DiscardRequest::Declined;
        }
        DiscardRequest::Proceed
    }

    /// Apply the reload that backs a discard. A failed reload keeps the
    /// edits.
    pub fn finish_discard(
        &mut self,
        store: &mut ConfigStore,
        result: Result<Configuration, CoreError>,
    ) -> Result<(), String> {
        match result {
            Ok(doc) => {
                store.load(doc);
                info!(revision = store.revision(), "unsaved changes discarded");
                self.post_status(NoticeLevel::Info, DISCARDED);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "reload for discard failed, keeping edits");
                self.post_status(NoticeLevel::Error, LOAD_FAILED);
                Err(e.to_string())
            }
        }
    }

    /// Apply the initial load. A failure keeps whatever the store holds
    /// (the default document on first load). If the user already started
    /// editing, only the baseline moves.
    pub fn finish_initial_load(
        &mut self,
        store: &mut ConfigStore,
        result: Result<Configuration, CoreError>,
    ) -> Result<(), String> {
        match result {
            Ok(doc) if store.is_dirty() => {
                warn!("configuration loaded while edits are pending, keeping edits");
                store.rebase(doc);
                Ok(())
            }
            Ok(doc) => {
                info!(rooms = doc.rooms.len(), "configuration loaded");
                store.load(doc);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "configuration load failed, keeping current document");
                self.post_status(NoticeLevel::Error, LOAD_FAILED);
                Err(e.to_string())
            }
        }
    }

    // ── Notices ──────────────────────────────────────────────────────

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.ui.notice = Some(Notice::new(level, text, self.notice_ttl));
    }

    pub fn post_status(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.ui.status = Some(Notice::new(level, text, self.status_ttl));
    }

    /// Drop expired notices. Returns whether anything changed.
    pub fn expire_notices(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for slot in [&mut self.ui.notice, &mut self.ui.status] {
            if slot.as_ref().is_some_and(|n| n.is_expired(now)) {
                *slot = None;
                changed = true;
            }
        }
        changed
    }

    /// Earliest pending expiry, for scheduling the next tick.
    pub fn next_expiry(&self) -> Option<Instant> {
        [&self.ui.notice, &self.ui.status]
            .into_iter()
            .flatten()
            .map(|n| n.expires_at)
            .min()
    }
}

fn confirmation_for(store: &ConfigStore, action: &AdminAction) -> Option<String> {
    match action {
        AdminAction::DeleteRoom { room_id } => store
            .room(room_id)
            .map(|room| format!("Delete room \"{}\" and all its entities?", room.name)),
        AdminAction::RemoveEntity { room_id, index } => {
            let room = store.room(room_id)?;
            let entity = room.entities.get(*index)?;
            Some(format!("Remove {} from \"{}\"?", entity.id, room.name))
        }
        AdminAction::ResetToDefaults => {
            Some("Reset configuration to defaults? All rooms and styles will be replaced.".into())
        }
        _ => None,
    }
}

/// Run the store mutation. Returns the success notice text.
fn execute(store: &mut ConfigStore, action: AdminAction) -> Result<String, CoreError> {
    match action {
        AdminAction::AddRoom { name, icon } => {
            let id = store.add_room(&name, &icon)?;
            let name = store.room(id.as_str()).map_or(name, |room| room.name.clone());
            Ok(format!("Room \"{name}\" added"))
        }
        AdminAction::DeleteRoom { room_id } => {
            let room = store.delete_room(&room_id)?;
            Ok(format!("Room \"{}\" deleted", room.name))
        }
        AdminAction::AddEntity {
            room_id,
            entity_id,
            kind,
            subtype,
        } => {
            store.add_entity(&room_id, &entity_id, kind, subtype.as_deref())?;
            let room = store.room(&room_id).map(|room| room.name.clone()).unwrap_or_default();
            Ok(format!("Added {} to \"{room}\"", entity_id.trim()))
        }
        AdminAction::RemoveEntity { room_id, index } => {
            let removed = store.remove_entity(&room_id, index)?;
            let room = store.room(&room_id).map(|room| room.name.clone()).unwrap_or_default();
            Ok(format!("Removed {} from \"{room}\"", removed.id))
        }
        AdminAction::SetStyle { key, value } => {
            store.set_style(&key, &value);
            Ok(format!("Updated {key}"))
        }
        AdminAction::ResetToDefaults => {
            store.reset_to_defaults();
            Ok("Configuration reset to defaults".into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn controller() -> AdminController {
        AdminController::new(&DashboardOptions::default())
    }

    fn yes(_: &str) -> bool {
        true
    }

    #[test]
    fn huge_notice_ttl_does_not_overflow() {
        let mut admin = AdminController::new(&DashboardOptions {
            notice_ttl: Duration::from_secs(u64::MAX),
            status_ttl: Duration::from_secs(u64::MAX),
        });
        let mut store = ConfigStore::new();

        let outcome = admin.apply(
            &mut store,
            AdminAction::AddRoom {
                name: "Kitchen".into(),
                icon: String::new(),
            },
            &yes,
        );
        assert!(matches!(outcome, ActionOutcome::Applied));
        admin.post_status(NoticeLevel::Success, "Configuration saved");

        let now = Instant::now();
        assert!(!admin.expire_notices(now));
        assert!(admin.ui().notice.is_some());
        assert!(admin.next_expiry().is_some_and(|at| at > now));
    }

    #[test]
    fn validation_failure_posts_error_notice_without_mutation() {
        let mut admin = controller();
        let mut store = ConfigStore::new();

        let outcome = admin.apply(
            &mut store,
            AdminAction::AddRoom {
                name: " ".into(),
                icon: String::new(),
            },
            &yes,
        );

        assert!(matches!(outcome, ActionOutcome::Rejected(CoreError::Validation { .. })));
        assert_eq!(store.revision(), 0);
        let notice = admin.ui().notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.text, "Room name is required");
    }

    #[test]
    fn destructive_actions_ask_first() {
        let mut admin = controller();
        let mut store = ConfigStore::new();
        admin.apply(
            &mut store,
            AdminAction::AddRoom {
                name: "Garage".into(),
                icon: "mdi:garage".into(),
            },
            &yes,
        );
        let room_id = store.document().rooms[0].id.to_string();

        let asked = RefCell::new(Vec::new());
        let decline = |message: &str| {
            asked.borrow_mut().push(message.to_owned());
            false
        };
        let outcome = admin.apply(
            &mut store,
            AdminAction::DeleteRoom {
                room_id: room_id.clone(),
            },
            &decline,
        );
        assert!(matches!(outcome, ActionOutcome::Declined));
        assert_eq!(store.document().rooms.len(), 1);
        assert_eq!(
            asked.borrow().as_slice(),
            ["Delete room \"Garage\" and all its entities?"]
        );

        let outcome = admin.apply(&mut store, AdminAction::DeleteRoom { room_id }, &yes);
        assert!(matches!(outcome, ActionOutcome::Applied));
        assert!(store.document().rooms.is_empty());
    }

    #[test]
    fn tab_switch_is_not_an_edit() {
        let mut admin = controller();
        let store = ConfigStore::new();
        assert!(admin.select_tab(AdminTab::Styling));
        assert!(!admin.select_tab(AdminTab::Styling));
        assert_eq!(admin.ui().tab, AdminTab::Styling);
        assert_eq!(store.revision(), 0);
        assert!(admin.ui().notice.is_none());
    }

    #[test]
    fn save_is_single_flight() {
        let mut admin = controller();
        let mut store = ConfigStore::new();
        store.set_style("accent-color", "#ffffff");

        let SaveRequest::Started(doc) = admin.begin_save(&store) else {
            panic!("first save should start");
        };
        assert_eq!(admin.begin_save(&store), SaveRequest::AlreadyInFlight);

        admin.finish_save(&mut store, doc, Ok(())).unwrap();
        assert_eq!(admin.save_state(), &PendingSaveState::Idle);
        assert!(!store.is_dirty());
        assert_eq!(admin.ui().status.as_ref().unwrap().text, SAVE_SUCCEEDED);
    }

    #[test]
    fn failed_save_keeps_edits() {
        let mut admin = controller();
        let mut store = ConfigStore::new();
        store.set_style("accent-color", "#ffffff");
        let before = store.document().clone();

        let SaveRequest::Started(doc) = admin.begin_save(&store) else {
            panic!("save should start");
        };
        let err = CoreError::Transport {
            kind: crate::error::TransportKind::Rejected,
            message: "Save operation returned success: false".into(),
        };
        let message = admin.finish_save(&mut store, doc, Err(err)).unwrap_err();

        assert_eq!(message, "Save operation returned success: false");
        assert_eq!(
            admin.save_state(),
            &PendingSaveState::Error("Save operation returned success: false".into())
        );
        assert_eq!(store.document(), &before);
        assert!(store.is_dirty());
    }

    #[test]
    fn discard_without_changes_is_a_notice() {
        let mut admin = controller();
        let store = ConfigStore::new();
        assert_eq!(
            admin.request_discard(&store, &yes),
            DiscardRequest::NothingToDiscard
        );
        assert_eq!(admin.ui().notice.as_ref().unwrap().text, NOTHING_TO_DISCARD);
    }

    #[test]
    fn notices_expire() {
        let mut admin = controller();
        admin.notify(NoticeLevel::Info, "hello");
        admin.post_status(NoticeLevel::Success, "saved");

        let notice_expiry = admin.ui().notice.as_ref().unwrap().expires_at;
        assert_eq!(admin.next_expiry(), Some(notice_expiry));

        assert!(!admin.expire_notices(notice_expiry - Duration::from_millis(1)));
        assert!(admin.expire_notices(notice_expiry));
        assert!(admin.ui().notice.is_none());
        assert!(admin.ui().status.is_some());

        assert!(admin.expire_notices(notice_expiry + Duration::from_secs(3)));
        assert!(admin.ui().status.is_none());
    }
}
