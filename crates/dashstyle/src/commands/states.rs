//! `states`: live entity states over REST, grouped by domain.

use serde::Serialize;
use tabled::Tabled;

use dashstyle_core::{LiveStateCache, RestCommandSink};

use crate::cli::{GlobalOpts, StatesArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StateListing {
    domain: String,
    entity_id: String,
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&StateListing> for StateRow {
    fn from(s: &StateListing) -> Self {
        let state = match s.unit {
            Some(ref unit) => format!("{} {unit}", s.state),
            None => s.state.clone(),
        };
        Self {
            domain: s.domain.clone(),
            entity_id: s.entity_id.clone(),
            state,
            name: s.name.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(resolved: &Resolved, args: &StatesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let sink = RestCommandSink::new(&resolved.host)?;
    let mut cache = LiveStateCache::new();
    cache.replace(sink.snapshot().await?);

    let listings = listings(&cache, args.domain.as_deref());
    let out = output::render_list(
        global.output,
        &listings,
        |s| StateRow::from(s),
        |s| s.entity_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Domains in order, entities sorted within each.
fn listings(cache: &LiveStateCache, domain: Option<&str>) -> Vec<StateListing> {
    cache
        .by_domain()
        .into_iter()
        .filter(|(d, _)| domain.is_none_or(|want| want == *d))
        .flat_map(|(d, states)| {
            states.into_iter().map(move |s| StateListing {
                domain: d.to_owned(),
                entity_id: s.id.clone(),
                state: s.state.clone(),
                name: s.friendly_name().map(str::to_owned),
                unit: s.unit().map(str::to_owned),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use dashstyle_core::LiveEntityState;

    use super::*;

    fn cache() -> LiveStateCache {
        let mut cache = LiveStateCache::new();
        cache.replace(
            [
                LiveEntityState::new("sensor.temp", "21.5")
                    .with_attribute("unit_of_measurement", "°C"),
                LiveEntityState::new("light.b", "off"),
                LiveEntityState::new("light.a", "on").with_attribute("friendly_name", "Lamp"),
            ]
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect(),
        );
        cache
    }

    #[test]
    fn grouped_by_domain_then_entity() {
        let ids: Vec<String> = listings(&cache(), None)
            .into_iter()
            .map(|s| s.entity_id)
            .collect();
        assert_eq!(ids, ["light.a", "light.b", "sensor.temp"]);
    }

    #[test]
    fn domain_filter_and_units() {
        let only = listings(&cache(), Some("sensor"));
        assert_eq!(only.len(), 1);
        assert_eq!(StateRow::from(&only[0]).state, "21.5 °C");
    }
}
