// ── Per-domain card policy ──
//
// How a card looks and what tapping it does, keyed by the domain part of
// the entity id.

use crate::gateway::ServiceCall;
use crate::model::{LiveEntityState, domain_of, humanize_object_id};

use super::tree::{Availability, Card};

pub const NOT_FOUND_ICON: &str = "mdi:alert-circle-outline";
pub const NOT_FOUND_TEXT: &str = "Not Found";

const ACTIVE_STATES: [&str; 3] = ["on", "open", "playing"];

pub fn default_icon(domain: &str) -> &'static str {
    match domain {
        "light" => "mdi:lightbulb",
        "switch" => "mdi:toggle-switch",
        "sensor" => "mdi:eye",
        "scene" => "mdi:palette",
        "media_player" => "mdi:cast",
        "script" => "mdi:script-text",
        _ => "mdi:flash",
    }
}

pub fn is_active(state: &str) -> bool {
    ACTIVE_STATES.contains(&state)
}

/// Card presentation for one entity reference.
pub fn build_card(entity_id: &str, state: Option<&LiveEntityState>) -> Card {
    let Some(state) = state else {
        return Card {
            entity_id: entity_id.to_owned(),
            label: humanize_object_id(entity_id),
            icon: NOT_FOUND_ICON.to_owned(),
            secondary: NOT_FOUND_TEXT.to_owned(),
            active: false,
            availability: Availability::NotFound,
        };
    };

    let domain = domain_of(entity_id);
    let label = state
        .friendly_name()
        .map_or_else(|| humanize_object_id(entity_id), ToOwned::to_owned);

    let icon = match domain {
        "cover" if state.state == "closed" => "mdi:window-closed",
        "cover" => "mdi:window-open",
        _ => state.icon().unwrap_or_else(|| default_icon(domain)),
    }
    .to_owned();

    let secondary = match (domain, state.unit()) {
        ("sensor", Some(unit)) => format!("{} {unit}", state.state),
        _ => state.state.clone(),
    };

    let availability = if state.state == "unavailable" {
        Availability::Unavailable
    } else {
        Availability::Available
    };

    Card {
        entity_id: entity_id.to_owned(),
        label,
        icon,
        secondary,
        active: is_active(&state.state),
        availability,
    }
}

/// The service a tap issues, if the domain has one. Entities without live
/// state have no action.
pub fn default_action(entity_id: &str, state: Option<&LiveEntityState>) -> Option<ServiceCall> {
    let state = state?;
    let domain = domain_of(entity_id);
    let service = match domain {
        "light" | "switch" => "toggle",
        "scene" | "script" => "turn_on",
        "cover" if state.state == "closed" => "open_cover",
        "cover" => "close_cover",
        _ => return None,
    };
    Some(ServiceCall::new(domain, service, entity_id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_renders_not_found() {
        let card = build_card("light.kitchen_main", None);
        assert_eq!(card.label, "kitchen main");
        assert_eq!(card.icon, NOT_FOUND_ICON);
        assert_eq!(card.secondary, NOT_FOUND_TEXT);
        assert!(!card.active);
        assert_eq!(card.availability, Availability::NotFound);
    }

    #[test]
    fn attributes_override_defaults() {
        let state = LiveEntityState::new("light.desk", "on")
            .with_attribute("friendly_name", "Desk Lamp")
            .with_attribute("icon", "mdi:desk-lamp");
        let card = build_card("light.desk", Some(&state));
        assert_eq!(card.label, "Desk Lamp");
        assert_eq!(card.icon, "mdi:desk-lamp");
        assert!(card.active);
    }

    #[test]
    fn domain_defaults_apply() {
        let cases = [
            ("light.a", "mdi:lightbulb"),
            ("switch.a", "mdi:toggle-switch"),
            ("sensor.a", "mdi:eye"),
            ("scene.a", "mdi:palette"),
            ("media_player.a", "mdi:cast"),
            ("script.a", "mdi:script-text"),
            ("climate.a", "mdi:flash"),
        ];
        for (id, icon) in cases {
            let state = LiveEntityState::new(id, "idle");
            assert_eq!(build_card(id, Some(&state)).icon, icon, "{id}");
        }
    }

    #[test]
    fn cover_icon_follows_state() {
        let closed = LiveEntityState::new("cover.garage", "closed").with_attribute("icon", "mdi:garage");
        assert_eq!(build_card("cover.garage", Some(&closed)).icon, "mdi:window-closed");

        let open = LiveEntityState::new("cover.garage", "open");
        let card = build_card("cover.garage", Some(&open));
        assert_eq!(card.icon, "mdi:window-open");
        assert!(card.active);
    }

    #[test]
    fn sensor_text_includes_unit() {
        let state = LiveEntityState::new("sensor.outdoor", "18.5").with_attribute("unit_of_measurement", "°C");
        assert_eq!(build_card("sensor.outdoor", Some(&state)).secondary, "18.5 °C");

        let light = LiveEntityState::new("light.a", "off").with_attribute("unit_of_measurement", "lm");
        assert_eq!(build_card("light.a", Some(&light)).secondary, "off");
    }

    #[test]
    fn unavailable_state_is_flagged() {
        let state = LiveEntityState::new("media_player.tv", "unavailable");
        let card = build_card("media_player.tv", Some(&state));
        assert_eq!(card.availability, Availability::Unavailable);
        assert!(!card.active);
    }

    #[test]
    fn default_actions_follow_table() {
        let on = LiveEntityState::new("x.y", "on");
        assert_eq!(
            default_action("light.a", Some(&on)).unwrap(),
            ServiceCall::new("light", "toggle", "light.a")
        );
        assert_eq!(default_action("switch.a", Some(&on)).unwrap().service, "toggle");
        assert_eq!(default_action("scene.movie", Some(&on)).unwrap().service, "turn_on");
        assert_eq!(default_action("script.bedtime", Some(&on)).unwrap().service, "turn_on");

        let closed = LiveEntityState::new("cover.garage", "closed");
        let open = LiveEntityState::new("cover.garage", "open");
        assert_eq!(default_action("cover.garage", Some(&closed)).unwrap().service, "open_cover");
        assert_eq!(default_action("cover.garage", Some(&open)).unwrap().service, "close_cover");

        assert!(default_action("sensor.temp", Some(&on)).is_none());
        assert!(default_action("light.a", None).is_none());
    }
}
