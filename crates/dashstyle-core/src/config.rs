// ── Runtime configuration ──
//
// Plain structs the adapter hands to the core. Building them from config
// files, env vars and the keyring is dashstyle-config's job.

use std::time::Duration;

use dashstyle_api::TransportConfig;
use secrecy::SecretString;
use url::Url;

/// Connection settings for the host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Host base URL, e.g. `http://homeassistant.local:8123`.
    pub url: Url,
    /// Long-lived access token.
    pub token: SecretString,
    /// Per-request timeout for gateway calls.
    pub timeout: Duration,
}

impl HostConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
        }
    }
}

/// Presentation tunables for the dashboard component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Lifetime of action notices in the admin view.
    pub notice_ttl: Duration,
    /// Lifetime of gateway status banners (load/save outcome).
    pub status_ttl: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            notice_ttl: Duration::from_secs(3),
            status_ttl: Duration::from_secs(5),
        }
    }
}
