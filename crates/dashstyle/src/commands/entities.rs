//! Entity command handlers.

use serde::Serialize;
use tabled::Tabled;

use dashstyle_core::{AdminAction, CoreError, EntityKind};

use crate::cli::{EntitiesArgs, EntitiesCommand, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::live::LiveDashboard;
use super::util;

// ── Listing ─────────────────────────────────────────────────────────

/// One entity reference with its position and current host state.
#[derive(Debug, Serialize)]
struct Placement {
    room_id: String,
    room: String,
    index: usize,
    entity_id: String,
    #[serde(rename = "type")]
    kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtype: Option<String>,
    state: Option<String>,
}

#[derive(Tabled)]
struct PlacementRow {
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&Placement> for PlacementRow {
    fn from(p: &Placement) -> Self {
        let kind = match p.subtype {
            Some(ref subtype) => format!("{} ({subtype})", p.kind),
            None => p.kind.to_string(),
        };
        Self {
            room: p.room.clone(),
            index: p.index,
            entity_id: p.entity_id.clone(),
            kind,
            state: p.state.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

fn placements(live: &LiveDashboard, room_filter: Option<&str>) -> Vec<Placement> {
    let dashboard = live.dashboard();
    dashboard
        .store()
        .document()
        .rooms
        .iter()
        .filter(|room| room_filter.is_none_or(|id| room.id.as_str() == id))
        .flat_map(|room| {
            room.entities.iter().enumerate().map(move |(index, entity)| Placement {
                room_id: room.id.to_string(),
                room: room.name.clone(),
                index,
                entity_id: entity.id.to_string(),
                kind: entity.kind,
                subtype: entity.subtype.clone(),
                state: dashboard
                    .cache()
                    .get(entity.id.as_str())
                    .map(|s| s.state.clone()),
            })
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    resolved: &Resolved,
    args: EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    let result = run(&mut live, args, global).await;
    live.close();
    result
}

async fn run(
    live: &mut LiveDashboard,
    args: EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        EntitiesCommand::List { room } => {
            let doc = live.dashboard().store().document();
            let room_id = room.map(|r| util::resolve_room(doc, &r));
            if let Some(ref id) = room_id {
                if doc.room(id).is_none() {
                    return Err(CoreError::room_not_found(id.clone()).into());
                }
            }
            let rows = placements(live, room_id.as_deref());
            let out = output::render_list(
                global.output,
                &rows,
                |p| PlacementRow::from(p),
                |p| p.entity_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EntitiesCommand::Add {
            room,
            entity_id,
            kind,
            subtype,
        } => {
            live.require_admin()?;
            live.require_loaded()?;
            let room_id = util::resolve_room(live.dashboard().store().document(), &room);
            let action = AdminAction::AddEntity {
                room_id,
                entity_id: entity_id.clone(),
                kind,
                subtype,
            };
            live.apply(action, global.yes)?;
            live.save(global.quiet).await?;
            if !global.quiet {
                eprintln!("Added {entity_id}");
            }
            Ok(())
        }

        EntitiesCommand::Remove { room, index } => {
            live.require_admin()?;
            live.require_loaded()?;
            let room_id = util::resolve_room(live.dashboard().store().document(), &room);
            if !live.apply(AdminAction::RemoveEntity { room_id, index }, global.yes)? {
                return Ok(());
            }
            live.save(global.quiet).await?;
            if !global.quiet {
                eprintln!("Entity removed");
            }
            Ok(())
        }
    }
}
