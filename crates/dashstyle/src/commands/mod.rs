//! Command dispatch: bridges CLI args -> dashboard actions -> output.

pub mod activate;
pub mod config_cmd;
pub mod entities;
pub mod live;
pub mod reset;
pub mod rooms;
pub mod session;
pub mod show;
pub mod states;
pub mod styles;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a host-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Show(args) => show::handle(resolved, &args, global).await,
        Command::Watch => show::watch(resolved, global).await,
        Command::Rooms(args) => rooms::handle(resolved, args, global).await,
        Command::Entities(args) => entities::handle(resolved, args, global).await,
        Command::Styles(args) => styles::handle(resolved, args, global).await,
        Command::Reset => reset::handle(resolved, global).await,
        Command::Activate { entity_id } => activate::handle(resolved, &entity_id, global).await,
        Command::States(args) => states::handle(resolved, &args, global).await,
        Command::Session => session::run(resolved, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
