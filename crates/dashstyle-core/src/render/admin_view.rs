// ── Admin view ──
//
// The editable form tree, built strictly from the store's current
// (possibly unsaved) document and the admin UI state. Live state is never
// consulted.

use strum::IntoEnumIterator;

use crate::admin::{AdminTab, AdminUi, Notice};
use crate::model::{DEFAULT_ROOM_ICON, EntityKind, STYLE_DEFAULTS, Styles, is_recognized_style};
use crate::store::ConfigStore;

use super::tree::{AddRoomForm, AdminView, Banner, Control, EntityRow, RoomEditor, StyleField};

pub const SAVE_LABEL: &str = "Save Configuration";
pub const SAVING_LABEL: &str = "Saving...";
pub const DISCARD_LABEL: &str = "Discard Changes";

pub fn build_admin_view(store: &ConfigStore, ui: &AdminUi) -> AdminView {
    let doc = store.document();
    let saving = ui.save_state.is_saving();
    let dirty = store.is_dirty();

    let rooms = doc
        .rooms
        .iter()
        .map(|room| RoomEditor {
            room_id: room.id.to_string(),
            name: room.name.clone(),
            icon: room.icon.clone(),
            entities: room
                .entities
                .iter()
                .enumerate()
                .map(|(index, entity)| EntityRow {
                    index,
                    entity_id: entity.id.to_string(),
                    kind: entity.kind,
                    subtype: entity.subtype.clone(),
                })
                .collect(),
        })
        .collect();

    AdminView {
        tab: ui.tab,
        tabs: AdminTab::iter().collect(),
        rooms,
        add_room: AddRoomForm {
            default_icon: DEFAULT_ROOM_ICON.to_owned(),
        },
        entity_kinds: EntityKind::iter().collect(),
        styles: style_fields(&doc.styles),
        save: Control {
            label: if saving { SAVING_LABEL } else { SAVE_LABEL }.to_owned(),
            enabled: !saving,
        },
        discard: Control {
            label: DISCARD_LABEL.to_owned(),
            enabled: dirty,
        },
        save_state: ui.save_state.clone(),
        dirty,
        status: ui.status.as_ref().map(banner),
        notice: ui.notice.as_ref().map(banner),
        last_saved_at: store
            .last_saved_at()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    }
}

/// Recognized keys first, in their fixed order (falling back to the
/// built-in default when unset), then every other key alphabetically.
fn style_fields(styles: &Styles) -> Vec<StyleField> {
    let known = STYLE_DEFAULTS.iter().map(|(key, default)| StyleField {
        key: (*key).to_owned(),
        value: styles
            .get(*key)
            .cloned()
            .unwrap_or_else(|| (*default).to_owned()),
        default: Some((*default).to_owned()),
    });
    let custom = styles
        .iter()
        .filter(|(key, _)| !is_recognized_style(key))
        .map(|(key, value)| StyleField {
            key: key.clone(),
            value: value.clone(),
            default: None,
        });
    known.chain(custom).collect()
}

fn banner(notice: &Notice) -> Banner {
    Banner {
        text: notice.text.clone(),
        level: notice.level,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::admin::PendingSaveState;

    #[test]
    fn recognized_styles_come_first() {
        let mut store = ConfigStore::new();
        store.set_style("card-radius", "8px");
        store.set_style("accent-color", "#00ff00");
        let view = build_admin_view(&store, &AdminUi::default());

        let keys: Vec<&str> = view.styles.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["primary-color", "accent-color", "primary-font-family", "card-radius"]
        );
        assert_eq!(view.styles[1].value, "#00ff00");
        assert_eq!(view.styles[3].default, None);
    }

    #[test]
    fn save_control_reflects_pending_state() {
        let store = ConfigStore::new();
        let ui = AdminUi {
            save_state: PendingSaveState::Saving,
            ..AdminUi::default()
        };
        let view = build_admin_view(&store, &ui);
        assert_eq!(view.save.label, SAVING_LABEL);
        assert!(!view.save.enabled);
        assert!(!view.discard.enabled);

        let idle = build_admin_view(&store, &AdminUi::default());
        assert_eq!(idle.save.label, SAVE_LABEL);
        assert!(idle.save.enabled);
    }

    #[test]
    fn rows_carry_indices() {
        let mut store = ConfigStore::new();
        let room = store.add_room("Porch", "").unwrap();
        store
            .add_entity(room.as_str(), "light.porch", EntityKind::Light, None)
            .unwrap();
        store
            .add_entity(room.as_str(), "cover.gate", EntityKind::Cover, Some("gate"))
            .unwrap();

        let view = build_admin_view(&store, &AdminUi::default());
        let rows = &view.rooms[0].entities;
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].subtype.as_deref(), Some("gate"));
        assert!(view.dirty);
        assert!(view.discard.enabled);
        assert_eq!(view.entity_kinds.len(), 6);
    }
}
