//! `session`: an interactive, line-oriented dashboard shell.
//!
//! One `select!` loop multiplexes stdin, host pushes, gateway completions,
//! notice expiry and Ctrl-C. Each input line is one admin action or view
//! command; the current view is redrawn whenever it changes.

use std::cell::RefCell;
use std::io::Write as _;
use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use dashstyle_core::admin::AdminTab;
use dashstyle_core::{
    ActionOutcome, AdminAction, DiscardRequest, EntityKind, SaveRequest, Settled, ViewMode,
};

use crate::cli::{GlobalOpts, parse_entity_kind};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::live::LiveDashboard;
use super::util;

const HELP: &str = "\
Commands:
  add-room <name> [icon]                 add a room
  del-room <room> [-y]                   delete a room and its entities
  add-entity <room> <entity_id> <type> [subtype]
  del-entity <room> <index> [-y]         remove the entity at a position
  style <key> <value>                    set a style value
  tab rooms|styling                      switch admin tab
  toggle                                 switch between main and admin view
  save                                   persist the configuration
  discard [-y]                           drop unsaved changes
  reset [-y]                             reset to the default document
  tap <entity_id>                        issue the entity's default action
  show                                   redraw the current view
  help                                   this text
  quit                                   leave the session
Rooms can be given by id or by name. Quote names with spaces.";

// ── Line parsing ────────────────────────────────────────────────────

const CONFIRMING_VERBS: &[&str] = &["del-room", "del-entity", "discard", "reset"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    AddRoom {
        name: String,
        icon: String,
    },
    DelRoom {
        room: String,
        yes: bool,
    },
    AddEntity {
        room: String,
        entity_id: String,
        kind: EntityKind,
        subtype: Option<String>,
    },
    DelEntity {
        room: String,
        index: usize,
        yes: bool,
    },
    Style {
        key: String,
        value: String,
    },
    Tab(AdminTab),
    Toggle,
    Save,
    Discard {
        yes: bool,
    },
    Reset {
        yes: bool,
    },
    Tap(String),
    Show,
    Help,
    Quit,
}

/// Split a line into words. Double quotes group words; there are no
/// escapes.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if in_quotes {
        return Err("unterminated quote".into());
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut tokens = tokenize(line)?;
    // `-y` is a flag only for verbs that ask for confirmation; elsewhere
    // it is an ordinary argument.
    let yes = if tokens.first().is_some_and(|verb| CONFIRMING_VERBS.contains(&verb.as_str())) {
        let before = tokens.len();
        tokens.retain(|t| t != "-y" && t != "--yes");
        tokens.len() != before
    } else {
        false
    };
    let Some((verb, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let arg = |i: usize, what: &str| -> Result<String, String> {
        args.get(i)
            .cloned()
            .ok_or_else(|| format!("{verb}: missing {what}"))
    };

    let command = match verb.as_str() {
        "add-room" => SessionCommand::AddRoom {
            name: arg(0, "room name")?,
            icon: args.get(1).cloned().unwrap_or_default(),
        },
        "del-room" => SessionCommand::DelRoom {
            room: arg(0, "room")?,
            yes,
        },
        "add-entity" => SessionCommand::AddEntity {
            room: arg(0, "room")?,
            entity_id: arg(1, "entity id")?,
            kind: parse_entity_kind(&arg(2, "entity type")?)?,
            subtype: args.get(3).cloned(),
        },
        "del-entity" => {
            let raw = arg(1, "index")?;
            SessionCommand::DelEntity {
                room: arg(0, "room")?,
                index: raw
                    .parse()
                    .map_err(|_| format!("{verb}: '{raw}' is not a valid index"))?,
                yes,
            }
        }
        "style" => {
            if args.len() < 2 {
                return Err("style: usage: style <key> <value>".into());
            }
            SessionCommand::Style {
                key: arg(0, "key")?,
                value: args[1..].join(" "),
            }
        }
        "tab" => {
            let raw = arg(0, "tab name")?;
            SessionCommand::Tab(
                AdminTab::from_str(&raw.to_lowercase())
                    .map_err(|_| format!("tab: unknown tab '{raw}' (rooms, styling)"))?,
            )
        }
        "toggle" => SessionCommand::Toggle,
        "save" => SessionCommand::Save,
        "discard" => SessionCommand::Discard { yes },
        "reset" => SessionCommand::Reset { yes },
        "tap" => SessionCommand::Tap(arg(0, "entity id")?),
        "show" => SessionCommand::Show,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

// ── Shell loop ──────────────────────────────────────────────────────

pub async fn run(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    let shell = Shell {
        painter: Painter::new(global.color),
        global,
    };
    if let Some(message) = live.load_error() {
        eprintln!("warning: {message}; starting from the default dashboard");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    shell.redraw(&live);

    let result = loop {
        let deadline = live.dashboard.next_notice_expiry();
        // Never fires while there is nothing to expire.
        let far = Instant::now() + Duration::from_secs(86_400);

        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break Ok(()),
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(CliError::Io(e)),
                };
                match parse_line(&line) {
                    Ok(Some(SessionCommand::Quit)) => break Ok(()),
                    Ok(Some(command)) => shell.execute(&mut live, command),
                    Ok(None) => shell.prompt(),
                    Err(message) => {
                        eprintln!("{message}");
                        shell.prompt();
                    }
                }
            }
            changed = live.states.changed() => {
                if changed.is_err() {
                    break Err(CliError::ConnectionFailed {
                        message: "host state feed closed".into(),
                    });
                }
                live.apply_push();
                if live.dashboard.mode() == ViewMode::Main {
                    shell.redraw(&live);
                }
            }
            Some(completion) = live.dashboard.next_completion() => {
                let settled = live.dashboard.apply_completion(completion);
                shell.report(&live, &settled);
                shell.redraw(&live);
            }
            () = sleep_until(deadline.unwrap_or(far)), if deadline.is_some() => {
                if live.dashboard.expire_notices(Instant::now())
                    && live.dashboard.mode() == ViewMode::Admin
                {
                    shell.redraw(&live);
                }
            }
        }
    };

    live.close();
    result
}

struct Shell<'a> {
    painter: Painter,
    global: &'a GlobalOpts,
}

impl Shell<'_> {
    fn prompt(&self) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "dashstyle> ");
        let _ = stdout.flush();
    }

    fn redraw(&self, live: &LiveDashboard) {
        let view = live.dashboard().current_view();
        let out = output::render_view(self.global.output, &view, self.painter);
        output::print_output(&out, false);
        self.prompt();
    }

    fn report(&self, live: &LiveDashboard, settled: &Settled) {
        // The admin view shows its own status banner.
        if live.dashboard().mode() == ViewMode::Admin {
            return;
        }
        match settled {
            Settled::Saved => eprintln!("Configuration saved"),
            Settled::Discarded => eprintln!("Unsaved changes discarded"),
            Settled::SaveFailed(message)
            | Settled::LoadFailed(message)
            | Settled::DiscardFailed(message) => eprintln!("error: {message}"),
            Settled::Loaded | Settled::Ignored => {}
        }
    }

    fn execute(&self, live: &mut LiveDashboard, command: SessionCommand) {
        debug!(?command, "session command");
        let action = match command {
            SessionCommand::AddRoom { name, icon } => AdminAction::AddRoom { name, icon },
            SessionCommand::DelRoom { room, yes } => {
                let room_id = room_id(live, &room);
                return self.admin(live, AdminAction::DeleteRoom { room_id }, yes);
            }
            SessionCommand::AddEntity {
                room,
                entity_id,
                kind,
                subtype,
            } => AdminAction::AddEntity {
                room_id: room_id(live, &room),
                entity_id,
                kind,
                subtype,
            },
            SessionCommand::DelEntity { room, index, yes } => {
                let room_id = room_id(live, &room);
                return self.admin(live, AdminAction::RemoveEntity { room_id, index }, yes);
            }
            SessionCommand::Style { key, value } => AdminAction::SetStyle { key, value },
            SessionCommand::Tab(tab) => {
                live.dashboard_mut().select_tab(tab);
                if live.dashboard().mode() == ViewMode::Main {
                    eprintln!("The {tab} tab is shown in the admin view ('toggle')");
                }
                return self.redraw(live);
            }
            SessionCommand::Reset { yes } => {
                return self.admin(live, AdminAction::ResetToDefaults, yes);
            }
            SessionCommand::Toggle => {
                let before = live.dashboard().mode();
                if live.dashboard_mut().toggle_view() == before {
                    eprintln!("Admin access is not enabled for this profile");
                }
                return self.redraw(live);
            }
            SessionCommand::Save => {
                match live.dashboard_mut().save() {
                    SaveRequest::AlreadyInFlight => eprintln!("A save is already in progress"),
                    SaveRequest::Denied => eprintln!("Admin access is not enabled for this profile"),
                    SaveRequest::Started(_) => {}
                }
                return self.redraw(live);
            }
            SessionCommand::Discard { yes } => {
                let asked = RefCell::new(None);
                let confirm = self.confirmer(yes, &asked);
                match live.dashboard_mut().discard(&confirm) {
                    DiscardRequest::Declined => Self::declined(asked.borrow_mut().take()),
                    DiscardRequest::Denied => {
                        eprintln!("Admin access is not enabled for this profile");
                    }
                    DiscardRequest::NothingToDiscard | DiscardRequest::Proceed => {}
                }
                return self.redraw(live);
            }
            SessionCommand::Tap(entity_id) => {
                match live.dashboard_mut().activate_card(&entity_id) {
                    Some(call) => eprintln!("→ {call}"),
                    None => eprintln!("{entity_id}: no action available"),
                }
                return self.prompt();
            }
            SessionCommand::Show => return self.redraw(live),
            SessionCommand::Help => {
                println!("{HELP}");
                return self.prompt();
            }
            SessionCommand::Quit => return,
        };
        self.admin(live, action, false);
    }

    fn admin(&self, live: &mut LiveDashboard, action: AdminAction, yes: bool) {
        let asked = RefCell::new(None);
        let confirm = self.confirmer(yes, &asked);
        match live.dashboard_mut().admin_action(action, &confirm) {
            ActionOutcome::Declined => Self::declined(asked.borrow_mut().take()),
            ActionOutcome::Rejected(err) if live.dashboard().mode() == ViewMode::Main => {
                eprintln!("error: {err}");
            }
            ActionOutcome::Applied | ActionOutcome::Rejected(_) => {}
        }
        self.redraw(live);
    }

    /// Approves when `-y` was given (on the line or globally), otherwise
    /// remembers the question so it can be shown.
    fn confirmer<'c>(
        &self,
        yes: bool,
        asked: &'c RefCell<Option<String>>,
    ) -> impl Fn(&str) -> bool + 'c {
        let approved = yes || self.global.yes;
        move |message: &str| {
            if !approved {
                *asked.borrow_mut() = Some(message.to_owned());
            }
            approved
        }
    }

    fn declined(question: Option<String>) {
        if let Some(question) = question {
            eprintln!("{question} Repeat with -y to confirm.");
        }
    }
}

fn room_id(live: &LiveDashboard, reference: &str) -> String {
    util::resolve_room(live.dashboard().store().document(), reference)
}
