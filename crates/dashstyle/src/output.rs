//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line. The
//! dashboard views get a dedicated text layout for `table` output.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use dashstyle_core::NoticeLevel;
use dashstyle_core::admin::AdminTab;
use dashstyle_core::render::tree::{AdminView, Availability, Banner, Card, MainView, View};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Applies colors only when enabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            color: should_color(mode),
        }
    }

    fn heading(self, text: &str) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_owned()
        }
    }

    fn dim(self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_owned()
        }
    }

    fn active(self, text: &str) -> String {
        if self.color {
            text.yellow().bold().to_string()
        } else {
            text.to_owned()
        }
    }

    fn level(self, level: NoticeLevel, text: &str) -> String {
        if !self.color {
            return text.to_owned();
        }
        match level {
            NoticeLevel::Success => text.green().to_string(),
            NoticeLevel::Error => text.red().to_string(),
            NoticeLevel::Info => text.blue().to_string(),
        }
    }

    fn warn(self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_owned()
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Render a dashboard view. `plain` emits the entity ids (main) or room
/// ids (admin).
pub fn render_view(format: OutputFormat, view: &View, painter: Painter) -> String {
    render_single(
        format,
        view,
        |v| match v {
            View::Main(main) => format_main_view(main, painter),
            View::Admin(admin) => format_admin_view(admin, painter),
        },
        |v| match v {
            View::Main(main) => main
                .cards()
                .map(|card| card.entity_id.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            View::Admin(admin) => admin
                .rooms
                .iter()
                .map(|room| room.room_id.clone())
                .collect::<Vec<_>>()
                .join("\n"),
        },
    )
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Dashboard views ──────────────────────────────────────────────────

pub fn format_main_view(view: &MainView, painter: Painter) -> String {
    if let Some(ref placeholder) = view.placeholder {
        return painter.dim(placeholder);
    }

    let label_width = view.cards().map(|c| c.label.chars().count()).max().unwrap_or(0);
    let state_width = view
        .cards()
        .map(|c| c.secondary.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (i, section) in view.sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} {}",
            painter.heading(&section.title),
            painter.dim(&format!("({})", section.icon))
        );
        if section.cards.is_empty() {
            let _ = writeln!(out, "  {}", painter.dim("(no entities)"));
        }
        for card in &section.cards {
            let _ = writeln!(
                out,
                "  {}",
                format_card(card, label_width, state_width, painter)
            );
        }
    }
    out.trim_end().to_owned()
}

fn format_card(card: &Card, label_width: usize, state_width: usize, painter: Painter) -> String {
    let marker = match card.availability {
        Availability::NotFound => "✗",
        Availability::Unavailable => "·",
        Availability::Available if card.active => "●",
        Availability::Available => "○",
    };
    let label = format!("{:<label_width$}", card.label);
    let state = format!("{:<state_width$}", card.secondary);
    let (marker, state) = match card.availability {
        Availability::NotFound => (painter.warn(marker), painter.warn(&state)),
        Availability::Unavailable => (painter.dim(marker), painter.dim(&state)),
        Availability::Available if card.active => (painter.active(marker), painter.active(&state)),
        Availability::Available => (marker.to_owned(), state),
    };
    format!(
        "{marker} {label}  {state}  {}",
        painter.dim(&card.entity_id)
    )
}

pub fn format_admin_view(view: &AdminView, painter: Painter) -> String {
    let mut out = String::new();

    let tabs: Vec<String> = view
        .tabs
        .iter()
        .map(|tab| {
            if *tab == view.tab {
                painter.heading(&format!("[{tab}]"))
            } else {
                painter.dim(&tab.to_string())
            }
        })
        .collect();
    let _ = write!(out, "{}", tabs.join(" "));
    if view.dirty {
        let _ = write!(out, "  {}", painter.active("unsaved changes"));
    }
    if let Some(ref saved) = view.last_saved_at {
        let _ = write!(out, "  {}", painter.dim(&format!("last saved {saved}")));
    }
    out.push('\n');

    for banner in [&view.status, &view.notice].into_iter().flatten() {
        let _ = writeln!(out, "{}", format_banner(banner, painter));
    }
    out.push('\n');

    match view.tab {
        AdminTab::Rooms => format_room_editors(&mut out, view, painter),
        AdminTab::Styling => format_style_fields(&mut out, view, painter),
    }

    out.push('\n');
    let controls = [&view.save, &view.discard]
        .iter()
        .map(|c| {
            let label = format!("[{}]", c.label);
            if c.enabled { label } else { painter.dim(&label) }
        })
        .collect::<Vec<_>>()
        .join(" ");
    out.push_str(&controls);
    out
}

fn format_banner(banner: &Banner, painter: Painter) -> String {
    painter.level(banner.level, &format!("{}: {}", banner.level, banner.text))
}

fn format_room_editors(out: &mut String, view: &AdminView, painter: Painter) {
    if view.rooms.is_empty() {
        let _ = writeln!(out, "{}", painter.dim("No rooms yet"));
    }
    for room in &view.rooms {
        let _ = writeln!(
            out,
            "{} {} {}",
            painter.heading(&room.name),
            room.icon,
            painter.dim(&room.room_id)
        );
        for row in &room.entities {
            let subtype = row
                .subtype
                .as_deref()
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  [{}] {}  {}{subtype}",
                row.index, row.entity_id, row.kind
            );
        }
    }
    let kinds: Vec<String> = view.entity_kinds.iter().map(ToString::to_string).collect();
    let _ = writeln!(
        out,
        "{}",
        painter.dim(&format!(
            "new room icon: {} · entity types: {}",
            view.add_room.default_icon,
            kinds.join(", ")
        ))
    );
}

fn format_style_fields(out: &mut String, view: &AdminView, painter: Painter) {
    let width = view
        .styles
        .iter()
        .map(|f| f.key.chars().count())
        .max()
        .unwrap_or(0);
    for field in &view.styles {
        let default = field
            .default
            .as_deref()
            .filter(|d| *d != field.value)
            .map(|d| painter.dim(&format!("  (default {d})")))
            .unwrap_or_default();
        let _ = writeln!(out, "{:<width$} = {}{default}", field.key, field.value);
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-printed JSON.
pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        render_json_compact(data)
    } else {
        render_json_pretty(data)
    }
}

/// YAML output.
pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}
