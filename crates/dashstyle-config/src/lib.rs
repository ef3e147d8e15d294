//! Configuration for the dashstyle CLI.
//!
//! TOML profiles layered with `DASHSTYLE_*` environment overrides, access
//! token resolution (flag, env, keyring, plaintext), and translation to the
//! core's `HostConfig` and `DashboardOptions`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dashstyle_core::{DashboardOptions, HostConfig};

pub const KEYRING_SERVICE: &str = "dashstyle";
pub const ENV_PREFIX: &str = "DASHSTYLE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named host profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`,
    /// then `"default"`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Gateway request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_notice_ttl")]
    pub notice_ttl_secs: u64,

    #[serde(default = "default_status_ttl")]
    pub status_ttl_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            notice_ttl_secs: default_notice_ttl(),
            status_ttl_secs: default_status_ttl(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_notice_ttl() -> u64 {
    3
}
fn default_status_ttl() -> u64 {
    5
}
fn default_admin() -> bool {
    true
}

/// A named host profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Host base URL (e.g., "http://homeassistant.local:8123").
    pub url: String,

    /// Long-lived access token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Admin flag handed to the dashboard.
    #[serde(default = "default_admin")]
    pub admin: bool,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dashstyle", "dashstyle").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dashstyle");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, still layering `DASHSTYLE_*` overrides.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

/// Serialize to pretty TOML, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
}

/// Resolve the access token: CLI flag, then the profile's `token_env`,
/// then the system keyring, then plaintext.
pub fn resolve_token(
    profile: &Profile,
    profile_name: &str,
    flag: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. CLI flag
    if let Some(token) = flag.filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token.to_owned()));
    }

    // 2. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a token in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Build a `HostConfig` from a profile. `defaults.timeout` applies when
/// the profile has no override.
pub fn profile_to_host_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    token_flag: Option<&str>,
) -> Result<HostConfig, ConfigError> {
    let url = parse_url(&profile.url)?;
    let token = resolve_token(profile, profile_name, token_flag)?;
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(HostConfig {
        url,
        token,
        timeout,
    })
}

pub fn dashboard_options(defaults: &Defaults) -> DashboardOptions {
    DashboardOptions {
        notice_ttl: Duration::from_secs(defaults.notice_ttl_secs),
        status_ttl: Duration::from_secs(defaults.status_ttl_secs),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn profile(token: Option<&str>) -> Profile {
        Profile {
            url: "http://homeassistant.local:8123".into(),
            token: token.map(str::to_owned),
            token_env: None,
            timeout: None,
            admin: true,
        }
    }

    #[test]
    fn loads_profiles_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults]
timeout = 20

[profiles.home]
url = "https://ha.example.org"
token = "plain"
admin = false
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profile_name(None), "home");
        assert_eq!(cfg.profile_name(Some("other")), "other");
        assert_eq!(cfg.defaults.timeout, 20);
        assert_eq!(cfg.defaults.notice_ttl_secs, 3);
        let home = &cfg.profiles["home"];
        assert!(!home.admin);
        assert_eq!(home.token.as_deref(), Some("plain"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.status_ttl_secs, 5);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), profile(Some("abc")));

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].url, "http://homeassistant.local:8123");
    }

    #[test]
    fn flag_beats_plaintext() {
        let token = resolve_token(&profile(Some("plain")), "t-flag", Some("from-flag")).unwrap();
        assert_eq!(token.expose_secret(), "from-flag");
    }

    #[test]
    fn token_env_beats_plaintext() {
        let Ok(path_value) = std::env::var("PATH") else {
            return;
        };
        let mut p = profile(Some("plain"));
        p.token_env = Some("PATH".into());
        let token = resolve_token(&p, "t-env", None).unwrap();
        assert_eq!(token.expose_secret(), path_value);
    }

    #[test]
    fn no_token_is_an_error() {
        let err = resolve_token(&profile(None), "dashstyle-test-no-token", None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn host_config_uses_default_timeout() {
        let defaults = Defaults::default();
        let host = profile_to_host_config(&profile(Some("abc")), "t-host", &defaults, Some("abc")).unwrap();
        assert_eq!(host.timeout, Duration::from_secs(10));
        assert_eq!(host.url.host_str(), Some("homeassistant.local"));

        let mut slow = profile(Some("abc"));
        slow.timeout = Some(30);
        let host = profile_to_host_config(&slow, "t-host", &defaults, Some("abc")).unwrap();
        assert_eq!(host.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(parse_url("not a url"), Err(ConfigError::Validation { .. })));
        assert!(matches!(
            parse_url("ftp://ha.local"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn options_follow_defaults() {
        let options = dashboard_options(&Defaults::default());
        assert_eq!(options, DashboardOptions::default());
    }
}
