//! `show` and `watch`: render the dashboard from live host state.

use std::io::IsTerminal;

use dashstyle_core::ViewMode;
use tracing::debug;

use crate::cli::{GlobalOpts, OutputFormat, ShowArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::live::LiveDashboard;

pub async fn handle(resolved: &Resolved, args: &ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    if let Some(message) = live.load_error() {
        if !global.quiet {
            eprintln!("warning: {message}; showing the default dashboard");
        }
    }

    if args.admin {
        live.require_admin()?;
        live.dashboard_mut().set_view(ViewMode::Admin);
    }

    let view = live.dashboard().current_view();
    let out = output::render_view(global.output, &view, Painter::new(global.color));
    output::print_output(&out, global.quiet);
    live.close();
    Ok(())
}

/// Re-render the main view on every host push until Ctrl-C.
pub async fn watch(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    let painter = Painter::new(global.color);
    let streaming = global.output != OutputFormat::Table;

    print_main(&live, global, painter, streaming);
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, leaving watch");
                break;
            }
            pushed = live.next_push() => {
                pushed?;
                print_main(&live, global, painter, streaming);
            }
        }
    }

    live.close();
    Ok(())
}

fn print_main(live: &LiveDashboard, global: &GlobalOpts, painter: Painter, streaming: bool) {
    let view = live.dashboard().current_view();
    // Structured formats emit one compact document per push.
    let format = if streaming && global.output == OutputFormat::Json {
        OutputFormat::JsonCompact
    } else {
        global.output
    };
    let out = output::render_view(format, &view, painter);
    if !streaming && !global.quiet && std::io::stdout().is_terminal() {
        // Clear the screen and home the cursor between frames.
        print!("\x1b[2J\x1b[H");
    }
    output::print_output(&out, global.quiet);
}
