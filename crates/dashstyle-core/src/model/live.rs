// ── Live entity state ──
//
// Read-only view of what the host reports for an entity. Attribute access
// is lenient: a missing or non-string attribute reads as absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity_id::domain_of;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEntityState {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// A full host push, keyed by entity id.
pub type LiveSnapshot = HashMap<String, LiveEntityState>;

impl LiveEntityState {
    pub fn new(id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter, mostly for adapters and tests.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    pub fn domain(&self) -> &str {
        domain_of(&self.id)
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attribute_str("friendly_name")
    }

    pub fn icon(&self) -> Option<&str> {
        self.attribute_str("icon")
    }

    pub fn unit(&self) -> Option<&str> {
        self.attribute_str("unit_of_measurement")
    }
}

impl From<dashstyle_api::HostState> for LiveEntityState {
    fn from(state: dashstyle_api::HostState) -> Self {
        Self {
            id: state.entity_id,
            state: state.state,
            attributes: state.attributes,
        }
    }
}

/// Build a snapshot from host states, keyed by id.
pub fn snapshot_from_host<I>(states: I) -> LiveSnapshot
where
    I: IntoIterator<Item = dashstyle_api::HostState>,
{
    states
        .into_iter()
        .map(|state| {
            let live = LiveEntityState::from(state);
            (live.id.clone(), live)
        })
        .collect()
}
