//! Shared helpers for command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use dashstyle_core::Configuration;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// A spinner on stderr; hidden in quiet mode.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Resolve a room reference: an exact room id, or a case-insensitive
/// name that matches exactly one room. Anything else is returned as-is
/// so the store reports it as not found.
pub fn resolve_room(doc: &Configuration, reference: &str) -> String {
    if doc.room(reference).is_some() {
        return reference.to_owned();
    }
    let mut by_name = doc
        .rooms
        .iter()
        .filter(|room| room.name.eq_ignore_ascii_case(reference.trim()));
    match (by_name.next(), by_name.next()) {
        (Some(room), None) => room.id.to_string(),
        _ => reference.to_owned(),
    }
}
