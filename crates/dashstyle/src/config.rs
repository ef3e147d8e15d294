//! CLI configuration: a thin wrapper around `dashstyle_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--url, --token,
//! --timeout) on top of the active profile.

use dashstyle_core::{DashboardOptions, HostConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use dashstyle_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

/// Everything a host-bound command needs.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub host: HostConfig,
    /// Admin flag handed to the dashboard component.
    pub admin: bool,
    pub options: DashboardOptions,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build the host connection settings from the config file, the active
/// profile, and CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    resolve_with(&cfg, global)
}

pub fn resolve_with(cfg: &Config, global: &GlobalOpts) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => apply_overrides(profile.clone(), global),
        None => match global.url {
            // No profile: run from flags / env alone.
            Some(ref url) => Profile {
                url: url.clone(),
                token: None,
                token_env: None,
                timeout: global.timeout,
                admin: true,
            },
            None if global.profile.is_some() => {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }
            None => {
                return Err(CliError::NoConfig {
                    path: config_path().display().to_string(),
                });
            }
        },
    };

    let host = dashstyle_config::profile_to_host_config(
        &profile,
        &profile_name,
        &cfg.defaults,
        global.token.as_deref(),
    )?;

    tracing::debug!(
        profile = %profile_name,
        url = %host.url,
        admin = profile.admin,
        "resolved host profile"
    );

    Ok(Resolved {
        admin: profile.admin,
        options: dashstyle_config::dashboard_options(&cfg.defaults),
        profile_name,
        host,
    })
}

/// CLI flags take priority over profile values.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::{ColorMode, OutputFormat};

    fn global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            url: None,
            token: None,
            output: OutputFormat::Table,
            color: ColorMode::Never,
            verbose: 0,
            quiet: false,
            yes: false,
            timeout: None,
        }
    }

    fn config_with_home() -> Config {
        let mut cfg = Config::default();
        cfg.default_profile = Some("home".into());
        cfg.profiles.insert(
            "home".into(),
            Profile {
                url: "http://ha.local:8123".into(),
                token: Some("plain".into()),
                token_env: None,
                timeout: Some(15),
                admin: false,
            },
        );
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let mut g = global();
        g.url = Some("https://ha.example.org".into());
        g.token = Some("flag-token".into());
        g.timeout = Some(42);

        let resolved = resolve_with(&config_with_home(), &g).unwrap();
        assert_eq!(resolved.profile_name, "home");
        assert_eq!(resolved.host.url.as_str(), "https://ha.example.org/");
        assert_eq!(resolved.host.token.expose_secret(), "flag-token");
        assert_eq!(resolved.host.timeout, Duration::from_secs(42));
        assert!(!resolved.admin);
    }

    #[test]
    fn flags_alone_are_enough() {
        let mut g = global();
        g.url = Some("http://ha.local:8123".into());
        g.token = Some("t".into());

        let resolved = resolve_with(&Config::default(), &g).unwrap();
        assert!(resolved.admin);
        assert_eq!(resolved.host.timeout, Duration::from_secs(10));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut g = global();
        g.profile = Some("office".into());

        let err = resolve_with(&config_with_home(), &g).unwrap_err();
        assert!(matches!(
            err,
            CliError::ProfileNotFound { ref available, .. } if available == "home"
        ));
    }

    #[test]
    fn nothing_configured_points_at_config_file() {
        let err = resolve_with(&Config::default(), &global()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
