//! `reset`: replace the document with the built-in defaults and save.

use dashstyle_core::AdminAction;

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;

use super::live::LiveDashboard;

pub async fn handle(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    let result = run(&mut live, global).await;
    live.close();
    result
}

async fn run(live: &mut LiveDashboard, global: &GlobalOpts) -> Result<(), CliError> {
    live.require_admin()?;
    // A failed load still allows a reset; the outcome is the same document.
    if !live.apply(AdminAction::ResetToDefaults, global.yes)? {
        return Ok(());
    }
    live.save(global.quiet).await?;
    if !global.quiet {
        eprintln!("Dashboard reset to defaults");
    }
    Ok(())
}
