// Shared transport configuration.
//
// The REST client and the WebSocket connection share the request timeout
// and user agent through this module, and derive their endpoints from the
// same host base URL.

use std::time::Duration;

use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("dashstyle/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout. Host RPCs that exceed it fail as transport errors.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared transport configuration for building host clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Transport)
    }

    /// Timeout in whole seconds, for error reporting.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}

/// Derive the WebSocket endpoint from the host base URL.
///
/// `http://host:8123` becomes `ws://host:8123/api/websocket`, `https` maps
/// to `wss`. A `ws`/`wss` base is accepted as-is. Any path on the base URL
/// is kept as a prefix (reverse-proxy setups).
pub fn websocket_url(base: &Url) -> Result<Url, Error> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::Protocol(format!(
                "unsupported URL scheme '{other}' (expected http, https, ws or wss)"
            )));
        }
    };
    let host = base
        .host_str()
        .ok_or_else(|| Error::Protocol(format!("URL has no host: {base}")))?;
    let prefix = base.path().trim_end_matches('/');
    let full = match base.port() {
        Some(port) => format!("{scheme}://{host}:{port}{prefix}/api/websocket"),
        None => format!("{scheme}://{host}{prefix}/api/websocket"),
    };
    Ok(Url::parse(&full)?)
}

/// Build a REST endpoint URL under `{base}/api/`.
pub(crate) fn api_url(base: &Url, path: &str) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/api/{path}"))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn http_maps_to_ws() {
        let base = Url::parse("http://homeassistant.local:8123").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "ws://homeassistant.local:8123/api/websocket"
        );
    }

    #[test]
    fn https_maps_to_wss_and_keeps_prefix() {
        let base = Url::parse("https://example.org/ha/").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "wss://example.org/ha/api/websocket"
        );
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let base = Url::parse("ftp://example.org").unwrap();
        assert!(matches!(websocket_url(&base), Err(Error::Protocol(_))));
    }

    #[test]
    fn api_url_joins_paths() {
        let base = Url::parse("http://ha:8123/").unwrap();
        assert_eq!(
            api_url(&base, "services/light/toggle").unwrap().as_str(),
            "http://ha:8123/api/services/light/toggle"
        );
    }
}
