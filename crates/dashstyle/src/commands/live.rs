//! A dashboard component wired to a live host session.
//!
//! Host-bound commands open one of these: connect, subscribe to state
//! pushes, feed the first snapshot (which triggers the configuration
//! load) and wait for the load to settle.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use dashstyle_api::StateSnapshot;
use dashstyle_core::{
    ActionOutcome, AdminAction, DashboardComponent, HostGateway, SaveRequest, Settled, live_snapshot,
};

use crate::config::Resolved;
use crate::error::CliError;

use super::util;

pub type Dashboard = DashboardComponent<HostGateway, HostGateway>;

pub struct LiveDashboard {
    pub(crate) dashboard: Dashboard,
    pub(crate) states: watch::Receiver<StateSnapshot>,
    gateway: HostGateway,
    admin: bool,
    profile: String,
    load_error: Option<String>,
}

impl LiveDashboard {
    /// Connect, subscribe, and wait for the initial configuration load.
    pub async fn open(resolved: &Resolved, quiet: bool) -> Result<Self, CliError> {
        let spinner = util::spinner("Connecting to host...", quiet);
        let connected = async {
            let gateway = HostGateway::connect(&resolved.host).await?;
            let states = gateway.subscribe_states().await?;
            Ok::<_, dashstyle_core::CoreError>((gateway, states))
        }
        .await;
        let (gateway, mut states) = match connected {
            Ok(pair) => pair,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e.into());
            }
        };

        let shared = Arc::new(gateway.clone());
        let mut dashboard = DashboardComponent::new(Arc::clone(&shared), shared, &resolved.options);
        let snapshot = live_snapshot(&states.borrow_and_update());
        dashboard.on_host_update(snapshot, resolved.admin);

        spinner.set_message("Loading dashboard configuration...");
        let load_error = match dashboard.settle().await {
            Settled::Loaded => None,
            Settled::LoadFailed(message) => {
                warn!(error = %message, "configuration load failed");
                Some(message)
            }
            other => {
                debug!(?other, "unexpected completion while loading");
                None
            }
        };
        spinner.finish_and_clear();

        info!(
            rooms = dashboard.store().document().rooms.len(),
            entities = dashboard.cache().len(),
            "dashboard ready"
        );

        Ok(Self {
            dashboard,
            states,
            gateway,
            admin: resolved.admin,
            profile: resolved.profile_name.clone(),
            load_error,
        })
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Editing commands need the admin flag.
    pub fn require_admin(&self) -> Result<(), CliError> {
        if self.admin {
            Ok(())
        } else {
            Err(self.admin_required())
        }
    }

    fn admin_required(&self) -> CliError {
        CliError::AdminRequired {
            profile: self.profile.clone(),
        }
    }

    /// Editing commands save the whole document, so they refuse to run
    /// on top of the fallback document after a failed load.
    pub fn require_loaded(&self) -> Result<(), CliError> {
        match self.load_error {
            Some(ref message) => Err(CliError::LoadFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Apply one admin action. Returns whether the document changed.
    pub fn apply(&mut self, action: AdminAction, yes: bool) -> Result<bool, CliError> {
        let confirm = |message: &str| util::confirm(message, yes).unwrap_or(false);
        match self.dashboard.admin_action(action, &confirm) {
            ActionOutcome::Applied => Ok(true),
            ActionOutcome::Declined => Ok(false),
            ActionOutcome::Rejected(err) => Err(err.into()),
        }
    }

    /// Save the current document and wait for the outcome.
    pub async fn save(&mut self, quiet: bool) -> Result<(), CliError> {
        match self.dashboard.save() {
            SaveRequest::Denied => return Err(self.admin_required()),
            SaveRequest::AlreadyInFlight => debug!("joining save already in flight"),
            SaveRequest::Started(_) => {}
        }
        let spinner = util::spinner("Saving configuration...", quiet);
        let result = loop {
            match self.dashboard.settle().await {
                Settled::Saved => break Ok(()),
                Settled::SaveFailed(message) => break Err(CliError::SaveFailed { message }),
                Settled::Ignored => {
                    break Err(CliError::SaveFailed {
                        message: "dashboard closed before the save completed".into(),
                    });
                }
                other => debug!(?other, "completion while saving"),
            }
        };
        spinner.finish_and_clear();
        result
    }

    /// Wait for the next host push and feed it to the dashboard.
    pub async fn next_push(&mut self) -> Result<(), CliError> {
        self.states
            .changed()
            .await
            .map_err(|_| CliError::ConnectionFailed {
                message: "host state feed closed".into(),
            })?;
        self.apply_push();
        Ok(())
    }

    /// Feed the latest published snapshot to the dashboard.
    pub fn apply_push(&mut self) {
        let snapshot = live_snapshot(&self.states.borrow_and_update());
        self.dashboard.on_host_update(snapshot, self.admin);
    }

    pub fn close(mut self) {
        self.dashboard.dispose();
        self.gateway.shutdown();
    }
}
