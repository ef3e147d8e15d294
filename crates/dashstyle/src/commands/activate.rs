//! `activate`: the one-shot version of tapping a card.

use dashstyle_core::render::policy::default_action;
use dashstyle_core::{CommandSink, LiveEntityState, RestCommandSink};

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

pub async fn handle(resolved: &Resolved, entity_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let sink = RestCommandSink::new(&resolved.host)?;
    let state = sink
        .client()
        .state(entity_id)
        .await
        .map_err(dashstyle_core::CoreError::from)?
        .map(LiveEntityState::from)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "Entity".into(),
            identifier: entity_id.into(),
            list_command: "states".into(),
        })?;

    let call = default_action(entity_id, Some(&state)).ok_or_else(|| CliError::Validation {
        field: "entity_id".into(),
        reason: format!("'{}' entities have no default action", state.domain()),
    })?;

    tracing::debug!(%call, "activating entity");
    sink.invoke(call.clone()).await?;

    let out = output::render_single(
        global.output,
        &call,
        |c| format!("Called {}.{} on {}", c.domain, c.service, c.entity_id),
        |c| format!("{}.{}", c.domain, c.service),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
