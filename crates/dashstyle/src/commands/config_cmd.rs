//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Confirm, Input, Password, Select};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext token.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "notice_ttl_secs = {}", cfg.defaults.notice_ttl_secs);
    let _ = writeln!(out, "status_ttl_secs = {}", cfg.defaults.status_ttl_secs);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        let _ = writeln!(out, "admin = {}", p.admin);
    }

    out.trim_end().to_owned()
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = Password::new()
        .with_prompt("Long-lived access token")
        .interact()
        .map_err(prompt_err)?;
    if token.trim().is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

#[derive(Serialize)]
struct ProfileListing {
    name: String,
    url: String,
    admin: bool,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Admin")]
    admin: bool,
}

impl From<&ProfileListing> for ProfileRow {
    fn from(p: &ProfileListing) -> Self {
        Self {
            marker: if p.default { "*" } else { "" },
            name: p.name.clone(),
            url: p.url.clone(),
            admin: p.admin,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                global.output,
                &redacted(&cfg),
                |_| format_config_redacted(&cfg),
                |_| config::config_path().display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { value } => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let token = match value {
                Some(v) => v,
                None => prompt_token()?,
            };
            dashstyle_config::store_token(&profile_name, &token)?;
            if !global.quiet {
                eprintln!("Token for profile '{profile_name}' stored in the system keyring");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.profile_name(None).to_owned();
            let mut listings: Vec<ProfileListing> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileListing {
                    name: name.clone(),
                    url: p.url.clone(),
                    admin: p.admin,
                    default: *name == default,
                })
                .collect();
            listings.sort_by(|a, b| a.name.cmp(&b.name));
            let out = output::render_list(
                global.output,
                &listings,
                |p| ProfileRow::from(p),
                |p| p.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// Clone with the plaintext token masked, for structured output.
fn redacted(cfg: &Config) -> Config {
    let mut copy = cfg.clone();
    for profile in copy.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    copy
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(config::active_profile_name(global, &cfg))
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Host URL")
        .default(
            global
                .url
                .clone()
                .unwrap_or_else(|| "http://homeassistant.local:8123".into()),
        )
        .interact_text()
        .map_err(prompt_err)?;
    dashstyle_config::parse_url(&url)?;

    let mut profile = Profile {
        url,
        token: None,
        token_env: None,
        timeout: None,
        admin: true,
    };

    let choices = &[
        "Store token in system keyring (recommended)",
        "Read token from an environment variable",
        "Save token to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Access token storage")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    match selection {
        0 => {
            let token = prompt_token()?;
            dashstyle_config::store_token(&name, &token)?;
            eprintln!("   ✓ token stored in system keyring");
        }
        1 => {
            let env: String = Input::new()
                .with_prompt("Environment variable name")
                .default("DASHSTYLE_TOKEN".into())
                .interact_text()
                .map_err(prompt_err)?;
            profile.token_env = Some(env);
        }
        _ => profile.token = Some(prompt_token()?),
    }

    profile.admin = Confirm::new()
        .with_prompt("Allow editing the dashboard from this profile?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;

    cfg.profiles.insert(name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }

    let path = config::save_config(&cfg)?;
    if !global.quiet {
        eprintln!("Profile '{name}' saved to {}", path.display());
    }
    Ok(())
}
