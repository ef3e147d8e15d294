use thiserror::Error;

/// Top-level error type for the `dashstyle-api` crate.
///
/// Covers every failure mode across both host surfaces: the WebSocket
/// RPC channel and the REST endpoints. `dashstyle-core` folds these into
/// its transport/decode taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The host rejected the access token (`auth_invalid` or HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status from a REST endpoint.
    #[error("Host API error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed while a request was outstanding.
    #[error("WebSocket closed: {reason}")]
    WebSocketClosed { reason: String },

    /// The host answered a command with `success: false`.
    #[error("Host command failed ({code}): {message}")]
    Rpc { code: String, message: String },

    /// The host sent something the protocol does not allow at this point.
    #[error("Protocol error: {0}")]
    Protocol(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the payload could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            Self::Rpc { code, .. } => code == "not_found",
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_transient() {
        assert!(Error::Timeout { timeout_secs: 10 }.is_transient());
        assert!(
            Error::WebSocketClosed {
                reason: "eof".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn rpc_failure_is_not_transient() {
        let err = Error::Rpc {
            code: "unknown_command".into(),
            message: "Unknown command.".into(),
        };
        assert!(!err.is_transient());
        assert!(!err.is_decode());
    }

    #[test]
    fn not_found_detection() {
        let http = Error::Http {
            status: 404,
            message: "Entity not found.".into(),
        };
        assert!(http.is_not_found());

        let rpc = Error::Rpc {
            code: "not_found".into(),
            message: "Entity not found".into(),
        };
        assert!(rpc.is_not_found());
    }
}
