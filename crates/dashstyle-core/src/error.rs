// ── Core error types ──
//
// User-facing errors from dashstyle-core. Local edit failures (validation,
// duplicate, not-found, index) never leave the admin controller except as
// notices; gateway failures surface as transport or decode errors. The
// `From<dashstyle_api::Error>` impl folds the host client's errors into
// those two variants.

use thiserror::Error;

/// What kind of transport failure occurred, so adapters can pick an exit
/// code or a retry policy without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TransportKind {
    /// Network unreachable, socket closed, HTTP failure.
    Connection,
    /// The host rejected the access token.
    Authentication,
    /// The request exceeded the gateway timeout.
    Timeout,
    /// The host answered but refused the operation (`success: false`).
    Rejected,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Local edit errors ────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    #[error("{entity_id} is already in room {room}")]
    Duplicate { entity_id: String, room: String },

    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: &'static str,
        identifier: String,
    },

    #[error("Entity index {index} out of range for room {room_id} ({len} entities)")]
    Index {
        room_id: String,
        index: usize,
        len: usize,
    },

    // ── Gateway errors ───────────────────────────────────────────────
    #[error("{message}")]
    Transport { kind: TransportKind, message: String },

    #[error("Malformed response: {message}")]
    Decode { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn room_not_found(room_id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Room",
            identifier: room_id.into(),
        }
    }

    /// Errors produced by local edits, reported as notices and never fatal.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Duplicate { .. } | Self::NotFound { .. } | Self::Index { .. }
        )
    }

    /// `NotFound` and its index flavor.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Index { .. })
    }

    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dashstyle_api::Error> for CoreError {
    fn from(err: dashstyle_api::Error) -> Self {
        use dashstyle_api::Error as Api;

        let kind = match &err {
            Api::Deserialization { message, .. } => {
                return Self::Decode {
                    message: message.clone(),
                };
            }
            Api::Authentication { .. } => TransportKind::Authentication,
            Api::Timeout { .. } => TransportKind::Timeout,
            Api::Transport(e) if e.is_timeout() => TransportKind::Timeout,
            Api::Rpc { .. } => TransportKind::Rejected,
            Api::Transport(_)
            | Api::InvalidUrl(_)
            | Api::Http { .. }
            | Api::WebSocketConnect(_)
            | Api::WebSocketClosed { .. }
            | Api::Protocol(_) => TransportKind::Connection,
        };

        // `success: false` on save carries its own user-facing message.
        let message = match err {
            Api::Rpc { message, .. } if !message.is_empty() => message,
            other => other.to_string(),
        };

        Self::Transport { kind, message }
    }
}
