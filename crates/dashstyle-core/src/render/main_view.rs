// ── Main view ──
//
// Full build from the current document plus the live cache, and the
// incremental patch used when only live state moved.

use tracing::trace;

use crate::store::{ConfigStore, LiveStateCache};

use super::policy::build_card;
use super::tree::{MainView, RoomSection};

pub const NO_ROOMS: &str = "No rooms configured";

pub fn build_main_view(store: &ConfigStore, cache: &LiveStateCache) -> MainView {
    let doc = store.document();
    let sections: Vec<RoomSection> = doc
        .rooms
        .iter()
        .map(|room| RoomSection {
            room_id: room.id.to_string(),
            title: room.name.clone(),
            icon: room.icon.clone(),
            cards: room
                .entities
                .iter()
                .map(|entity| build_card(entity.id.as_str(), cache.get(entity.id.as_str())))
                .collect(),
        })
        .collect();

    trace!(revision = store.revision(), rooms = sections.len(), "main view built");

    MainView {
        revision: store.revision(),
        placeholder: sections.is_empty().then(|| NO_ROOMS.to_owned()),
        sections,
    }
}

/// Refresh every card from `cache` without touching the section layout.
/// Only valid while the document revision matches `view.revision`.
pub fn patch_main_view(view: &mut MainView, cache: &LiveStateCache) {
    for section in &mut view.sections {
        for card in &mut section.cards {
            let fresh = build_card(&card.entity_id, cache.get(&card.entity_id));
            if *card != fresh {
                *card = fresh;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{EntityKind, LiveEntityState, LiveSnapshot};
    use crate::render::tree::Availability;

    fn push(cache: &mut LiveStateCache, states: Vec<LiveEntityState>) {
        let snapshot: LiveSnapshot = states.into_iter().map(|s| (s.id.clone(), s)).collect();
        cache.replace(snapshot);
    }

    fn kitchen_store() -> ConfigStore {
        let mut store = ConfigStore::new();
        let room = store.add_room("Kitchen", "mdi:chef-hat").unwrap();
        store
            .add_entity(room.as_str(), "light.kitchen_main", EntityKind::Light, None)
            .unwrap();
        store
            .add_entity(room.as_str(), "sensor.fridge_temp", EntityKind::Sensor, None)
            .unwrap();
        store
    }

    #[test]
    fn empty_document_shows_placeholder() {
        let view = build_main_view(&ConfigStore::new(), &LiveStateCache::new());
        assert!(view.sections.is_empty());
        assert_eq!(view.placeholder.as_deref(), Some(NO_ROOMS));
    }

    #[test]
    fn cards_follow_room_order() {
        let store = kitchen_store();
        let view = build_main_view(&store, &LiveStateCache::new());
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.sections[0].title, "Kitchen");
        let ids: Vec<&str> = view.cards().map(|c| c.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["light.kitchen_main", "sensor.fridge_temp"]);
        assert!(view.cards().all(|c| c.availability == Availability::NotFound));
    }

    #[test]
    fn build_is_idempotent() {
        let store = kitchen_store();
        let mut cache = LiveStateCache::new();
        push(&mut cache, vec![LiveEntityState::new("light.kitchen_main", "on")]);
        assert_eq!(build_main_view(&store, &cache), build_main_view(&store, &cache));
    }

    #[test]
    fn patch_matches_full_rebuild() {
        let store = kitchen_store();
        let mut cache = LiveStateCache::new();
        let mut view = build_main_view(&store, &cache);

        let pushes = vec![
            vec![LiveEntityState::new("light.kitchen_main", "on")],
            vec![
                LiveEntityState::new("light.kitchen_main", "unavailable"),
                LiveEntityState::new("sensor.fridge_temp", "4")
                    .with_attribute("unit_of_measurement", "°C")
                    .with_attribute("friendly_name", "Fridge"),
            ],
            vec![],
        ];

        for states in pushes {
            push(&mut cache, states);
            patch_main_view(&mut view, &cache);
            assert_eq!(view, build_main_view(&store, &cache));
        }
    }
}
