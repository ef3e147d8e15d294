//! Room command handlers.

use serde::Serialize;
use tabled::Tabled;

use dashstyle_core::{AdminAction, Room};

use crate::cli::{GlobalOpts, RoomsArgs, RoomsCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::live::LiveDashboard;
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Icon")]
    icon: String,
    #[tabled(rename = "Entities")]
    entities: usize,
}

impl From<&Room> for RoomRow {
    fn from(r: &Room) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name.clone(),
            icon: r.icon.clone(),
            entities: r.entities.len(),
        }
    }
}

#[derive(Serialize)]
struct Created<'a> {
    id: &'a str,
    name: &'a str,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(resolved: &Resolved, args: RoomsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    let result = run(&mut live, args, global).await;
    live.close();
    result
}

async fn run(live: &mut LiveDashboard, args: RoomsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        RoomsCommand::List => {
            let rooms = &live.dashboard().store().document().rooms;
            let out = output::render_list(
                global.output,
                rooms,
                |r| RoomRow::from(r),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Add { name, icon } => {
            live.require_admin()?;
            live.require_loaded()?;
            let before: Vec<String> = room_ids(live);
            live.apply(AdminAction::AddRoom { name, icon }, global.yes)?;
            live.save(global.quiet).await?;

            let doc = live.dashboard().store().document();
            if let Some(room) = doc.rooms.iter().find(|r| !before.contains(&r.id.to_string())) {
                let created = Created {
                    id: room.id.as_str(),
                    name: &room.name,
                };
                let out = output::render_single(
                    global.output,
                    &created,
                    |c| format!("Room '{}' added ({})", c.name, c.id),
                    |c| c.id.to_owned(),
                );
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        RoomsCommand::Remove { room } => {
            live.require_admin()?;
            live.require_loaded()?;
            let room_id = util::resolve_room(live.dashboard().store().document(), &room);
            if !live.apply(AdminAction::DeleteRoom { room_id }, global.yes)? {
                return Ok(());
            }
            live.save(global.quiet).await?;
            if !global.quiet {
                eprintln!("Room deleted");
            }
            Ok(())
        }
    }
}

fn room_ids(live: &LiveDashboard) -> Vec<String> {
    live.dashboard()
        .store()
        .document()
        .rooms
        .iter()
        .map(|r| r.id.to_string())
        .collect()
}
