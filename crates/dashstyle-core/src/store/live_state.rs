// ── LiveStateCache ──
//
// Latest full snapshot of host entity states. Replaced wholesale on every
// push; there is no partial update path.

use std::collections::BTreeMap;

use crate::model::{LiveEntityState, LiveSnapshot};

#[derive(Debug, Clone, Default)]
pub struct LiveStateCache {
    states: LiveSnapshot,
    version: u64,
}

impl LiveStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot and bump the version.
    pub fn replace(&mut self, snapshot: LiveSnapshot) {
        self.states = snapshot;
        self.version += 1;
    }

    pub fn get(&self, entity_id: &str) -> Option<&LiveEntityState> {
        self.states.get(entity_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Known entities grouped by domain, each group sorted by id. Used by
    /// entity pickers.
    pub fn by_domain(&self) -> BTreeMap<&str, Vec<&LiveEntityState>> {
        let mut groups: BTreeMap<&str, Vec<&LiveEntityState>> = BTreeMap::new();
        for state in self.states.values() {
            groups.entry(state.domain()).or_default().push(state);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.id.cmp(&b.id));
        }
        groups
    }
}
