//! Clap derive structures for the `dashstyle` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use strum::IntoEnumIterator;

use dashstyle_core::EntityKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dashstyle -- room dashboard for a home-automation host
#[derive(Debug, Parser)]
#[command(
    name = "dashstyle",
    version,
    about = "Room dashboard and dashboard editor for a home-automation host",
    long_about = "Renders rooms of entity cards from live host state, and edits the\n\
        persisted dashboard document (rooms, entities, styles) over the\n\
        host's WebSocket API.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Host profile to use
    #[arg(long, short = 'p', env = "DASHSTYLE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Host base URL (overrides profile)
    #[arg(long, short = 'u', env = "DASHSTYLE_URL", global = true)]
    pub url: Option<String>,

    /// Long-lived access token
    #[arg(long, env = "DASHSTYLE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DASHSTYLE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, env = "DASHSTYLE_COLOR", default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DASHSTYLE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the dashboard once
    Show(ShowArgs),

    /// Render the main view and follow live state until Ctrl-C
    Watch,

    /// Manage rooms
    #[command(alias = "r")]
    Rooms(RoomsArgs),

    /// Manage the entities placed in rooms
    #[command(alias = "e")]
    Entities(EntitiesArgs),

    /// View and edit theme styles
    Styles(StylesArgs),

    /// Reset the dashboard document to defaults and save
    Reset,

    /// Issue the default action for an entity (toggle, open/close, ...)
    #[command(alias = "tap")]
    Activate {
        /// Entity id, e.g. light.kitchen_main
        entity_id: String,
    },

    /// List live entity states grouped by domain
    States(StatesArgs),

    /// Interactive dashboard shell
    Session,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Show ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Render the admin (editor) view instead of the room cards
    #[arg(long)]
    pub admin: bool,
}

// ── Rooms ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RoomsArgs {
    #[command(subcommand)]
    pub command: RoomsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoomsCommand {
    /// List configured rooms
    #[command(alias = "ls")]
    List,

    /// Add a room and save
    Add {
        /// Display name
        name: String,

        /// Material Design icon id
        #[arg(long, short = 'i', default_value = "mdi:home")]
        icon: String,
    },

    /// Delete a room (and its entities) and save
    #[command(alias = "rm")]
    Remove {
        /// Room id or name
        room: String,
    },
}

// ── Entities ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    #[command(subcommand)]
    pub command: EntitiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntitiesCommand {
    /// List entity references, optionally for one room
    #[command(alias = "ls")]
    List {
        /// Room id or name
        #[arg(long, short = 'r')]
        room: Option<String>,
    },

    /// Add an entity to a room and save
    Add {
        /// Room id or name
        room: String,

        /// Entity id, e.g. light.kitchen_main
        entity_id: String,

        /// Entity type
        #[arg(long = "type", short = 't', value_parser = parse_entity_kind)]
        kind: EntityKind,

        /// Optional free-form subtype
        #[arg(long)]
        subtype: Option<String>,
    },

    /// Remove the entity at an index (see `entities list`) and save
    #[command(alias = "rm")]
    Remove {
        /// Room id or name
        room: String,

        /// Zero-based position in the room
        index: usize,
    },
}

pub fn parse_entity_kind(raw: &str) -> Result<EntityKind, String> {
    raw.trim()
        .to_lowercase()
        .replace('-', "_")
        .parse()
        .map_err(|_| {
            let known: Vec<String> = EntityKind::iter().map(|k| k.to_string()).collect();
            format!("unknown entity type '{raw}' (expected one of: {})", known.join(", "))
        })
}

// ── Styles ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StylesArgs {
    #[command(subcommand)]
    pub command: StylesCommand,
}

#[derive(Debug, Subcommand)]
pub enum StylesCommand {
    /// List style keys with their values and defaults
    #[command(alias = "ls")]
    List,

    /// Set a style value and save
    Set {
        /// Style key, e.g. primary-color
        key: String,

        /// New value
        value: String,
    },
}

// ── States ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatesArgs {
    /// Only show one domain, e.g. light
    #[arg(long, short = 'd')]
    pub domain: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile interactively
    Init,

    /// Show the effective configuration (secrets redacted)
    Show,

    /// Store a profile's access token in the system keyring
    SetToken {
        /// Token value (prompted when omitted)
        #[arg(long)]
        value: Option<String>,
    },

    /// List configured profiles
    Profiles,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
