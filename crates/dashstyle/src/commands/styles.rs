//! Style command handlers.

use tabled::Tabled;

use dashstyle_core::AdminAction;
use dashstyle_core::render::build_admin_view;
use dashstyle_core::render::tree::StyleField;

use crate::cli::{GlobalOpts, StylesArgs, StylesCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::live::LiveDashboard;

#[derive(Tabled)]
struct StyleRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Default")]
    default: String,
}

impl From<&StyleField> for StyleRow {
    fn from(f: &StyleField) -> Self {
        Self {
            key: f.key.clone(),
            value: f.value.clone(),
            default: f.default.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

pub async fn handle(resolved: &Resolved, args: StylesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut live = LiveDashboard::open(resolved, global.quiet).await?;
    let result = run(&mut live, args, global).await;
    live.close();
    result
}

async fn run(live: &mut LiveDashboard, args: StylesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StylesCommand::List => {
            // Same ordering as the admin editor: recognized keys first.
            let dashboard = live.dashboard();
            let fields = build_admin_view(dashboard.store(), dashboard.admin_ui()).styles;
            let out = output::render_list(
                global.output,
                &fields,
                |f| StyleRow::from(f),
                |f| format!("{}={}", f.key, f.value),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StylesCommand::Set { key, value } => {
            live.require_admin()?;
            live.require_loaded()?;
            live.apply(
                AdminAction::SetStyle {
                    key: key.clone(),
                    value: value.clone(),
                },
                global.yes,
            )?;
            live.save(global.quiet).await?;
            if !global.quiet {
                eprintln!("{key} = {value}");
            }
            Ok(())
        }
    }
}
