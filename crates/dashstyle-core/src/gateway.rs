// ── I/O seams ──
//
// The dashboard component never talks to the host directly. Configuration
// persistence goes through `RemoteConfigGateway`, device commands through
// `CommandSink`. The host-backed implementations live in `host`; tests use
// in-memory ones.

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::error::CoreError;
use crate::model::Configuration;

/// Async load/save of the configuration document.
pub trait RemoteConfigGateway: Send + Sync + 'static {
    /// Fetch the persisted document.
    fn load(&self) -> impl Future<Output = Result<Configuration, CoreError>> + Send;

    /// Persist the full document.
    fn save(&self, doc: Configuration) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Fire-and-forget device commands for card activation.
pub trait CommandSink: Send + Sync + 'static {
    fn invoke(&self, call: ServiceCall) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// One `domain.service` invocation targeting a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: String,
}

impl ServiceCall {
    pub fn new(domain: &str, service: &str, entity_id: &str) -> Self {
        Self {
            domain: domain.to_owned(),
            service: service.to_owned(),
            entity_id: entity_id.to_owned(),
        }
    }
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} → {}", self.domain, self.service, self.entity_id)
    }
}
