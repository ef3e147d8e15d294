// ── Host-backed seams ──
//
// `HostGateway` implements both seams over one authenticated WebSocket
// session. `RestCommandSink` issues service calls over REST for one-shot
// commands that never open a session.

use std::sync::Arc;

use dashstyle_api::{HostConnection, RestClient, StateSnapshot};
use tokio::sync::watch;
use tracing::debug;

use crate::config::HostConfig;
use crate::convert::{decode_configuration, encode_configuration};
use crate::error::CoreError;
use crate::gateway::{CommandSink, RemoteConfigGateway, ServiceCall};
use crate::model::{Configuration, LiveSnapshot, snapshot_from_host};

/// Configuration persistence and device commands over the host
/// WebSocket. Cheap to clone.
#[derive(Clone)]
pub struct HostGateway {
    conn: Arc<HostConnection>,
}

impl HostGateway {
    /// Connect and authenticate.
    pub async fn connect(config: &HostConfig) -> Result<Self, CoreError> {
        let conn = HostConnection::connect(&config.url, &config.token, &config.transport()).await?;
        Ok(Self::from_connection(Arc::new(conn)))
    }

    pub fn from_connection(conn: Arc<HostConnection>) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Arc<HostConnection> {
        &self.conn
    }

    /// Start the state feed. The receiver always holds the full snapshot.
    pub async fn subscribe_states(&self) -> Result<watch::Receiver<StateSnapshot>, CoreError> {
        Ok(self.conn.subscribe_states().await?)
    }

    pub fn shutdown(&self) {
        self.conn.shutdown();
    }
}

impl RemoteConfigGateway for HostGateway {
    async fn load(&self) -> Result<Configuration, CoreError> {
        let raw = self.conn.load_config().await?;
        debug!(empty = raw.is_null(), "configuration document received");
        decode_configuration(raw)
    }

    async fn save(&self, doc: Configuration) -> Result<(), CoreError> {
        let raw = encode_configuration(&doc)?;
        self.conn.save_config(&raw).await?;
        Ok(())
    }
}

impl CommandSink for HostGateway {
    async fn invoke(&self, call: ServiceCall) -> Result<(), CoreError> {
        self.conn
            .call_service(&call.domain, &call.service, &call.entity_id)
            .await?;
        Ok(())
    }
}

/// Service calls over REST.
pub struct RestCommandSink {
    client: RestClient,
}

impl RestCommandSink {
    pub fn new(config: &HostConfig) -> Result<Self, CoreError> {
        let client = RestClient::new(config.url.clone(), config.token.clone(), &config.transport())?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Current host states as a live snapshot.
    pub async fn snapshot(&self) -> Result<LiveSnapshot, CoreError> {
        Ok(snapshot_from_host(self.client.states().await?))
    }
}

impl CommandSink for RestCommandSink {
    async fn invoke(&self, call: ServiceCall) -> Result<(), CoreError> {
        self.client
            .call_service(&call.domain, &call.service, &call.entity_id)
            .await?;
        Ok(())
    }
}

/// Convert a published host snapshot for `DashboardComponent::on_host_update`.
pub fn live_snapshot(states: &StateSnapshot) -> LiveSnapshot {
    snapshot_from_host(states.values().cloned())
}
