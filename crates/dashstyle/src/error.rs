//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use dashstyle_config::ConfigError;
use dashstyle_core::{CoreError, TransportKind};

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the host: {message}")]
    #[diagnostic(
        code(dashstyle::connection_failed),
        help(
            "Check that the host is running and reachable.\n\
             Try: dashstyle states --url http://homeassistant.local:8123"
        )
    )]
    ConnectionFailed { message: String },

    #[error("Host refused the operation: {message}")]
    #[diagnostic(code(dashstyle::rejected))]
    Rejected { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(dashstyle::auth_failed),
        help(
            "Verify the long-lived access token for this profile.\n\
             Run: dashstyle config set-token --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No access token configured for profile '{profile}'")]
    #[diagnostic(
        code(dashstyle::no_credentials),
        help(
            "Configure one with: dashstyle config init\n\
             Or pass --token / set DASHSTYLE_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    #[error("Profile '{profile}' does not allow editing the dashboard")]
    #[diagnostic(
        code(dashstyle::admin_required),
        help("Set `admin = true` in the profile to enable editing commands.")
    )]
    AdminRequired { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(dashstyle::not_found),
        help("Run: dashstyle {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{identifier} is already in room {room}")]
    #[diagnostic(code(dashstyle::conflict))]
    Conflict { identifier: String, room: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dashstyle::validation))]
    Validation { field: String, reason: String },

    // ── Workflow ─────────────────────────────────────────────────────
    #[error("Could not load the dashboard configuration: {message}")]
    #[diagnostic(
        code(dashstyle::load_failed),
        help("Nothing was changed. Retry once the host answers configuration requests.")
    )]
    LoadFailed { message: String },

    #[error("Saving the dashboard configuration failed: {message}")]
    #[diagnostic(code(dashstyle::save_failed))]
    SaveFailed { message: String },

    #[error("Malformed response from host: {message}")]
    #[diagnostic(code(dashstyle::decode))]
    Decode { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(dashstyle::no_config),
        help(
            "Create one with: dashstyle config init\n\
             Expected at: {path}\n\
             Or pass --url and --token."
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dashstyle::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: dashstyle config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{0}")]
    #[diagnostic(code(dashstyle::config))]
    Config(String),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(dashstyle::timeout),
        help("Increase the timeout with --timeout or check host responsiveness.")
    )]
    Timeout { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::AdminRequired { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Duplicate { entity_id, room } => Self::Conflict {
                identifier: entity_id,
                room,
            },
            CoreError::NotFound { kind, identifier } => Self::NotFound {
                list_command: format!("{}s list", kind.to_lowercase()),
                resource_type: kind.into(),
                identifier,
            },
            CoreError::Index {
                room_id, index, ..
            } => Self::NotFound {
                resource_type: "Entity index".into(),
                identifier: index.to_string(),
                list_command: format!("entities list --room {room_id}"),
            },
            CoreError::Transport { kind, message } => match kind {
                TransportKind::Authentication => Self::AuthFailed { message },
                TransportKind::Timeout => Self::Timeout { message },
                TransportKind::Rejected => Self::Rejected { message },
                TransportKind::Connection => Self::ConnectionFailed { message },
            },
            CoreError::Decode { message } => Self::Decode { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}
