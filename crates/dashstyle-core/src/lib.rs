//! Configuration/live-state reconciliation engine behind the dashstyle
//! dashboard.
//!
//! The crate keeps an editable dashboard document and a read-only snapshot
//! of host entity states side by side, and renders either a main view
//! (rooms of entity cards) or an admin view (the editing forms) from them:
//!
//! - **[`ConfigStore`]**: the authoritative document plus its baseline
//!   (last persisted copy) and a revision counter. Only admin actions
//!   mutate it.
//!
//! - **[`LiveStateCache`]**: the latest full host snapshot, replaced
//!   wholesale on every push.
//!
//! - **[`render`]**: pure builders from store + cache to a UI tree, with an
//!   incremental patch for pushes that leave the document alone.
//!
//! - **[`AdminController`]**: maps edit actions to store calls, owns the
//!   save/discard workflow and transient notices.
//!
//! - **[`DashboardComponent`]**: the orchestrator the adapter drives. It
//!   reaches the host only through [`RemoteConfigGateway`] and
//!   [`CommandSink`]; [`HostGateway`] implements both over the host
//!   WebSocket.

pub mod admin;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod host;
pub mod model;
pub mod render;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use admin::{
    ActionOutcome, AdminAction, AdminController, AdminTab, AdminUi, Confirm, DiscardRequest,
    Notice, NoticeLevel, PendingSaveState, SaveRequest,
};
pub use config::{DashboardOptions, HostConfig};
pub use dashboard::{Completion, DashboardComponent, LoadPurpose, RenderStats, Settled};
pub use error::{CoreError, TransportKind};
pub use gateway::{CommandSink, RemoteConfigGateway, ServiceCall};
pub use host::{HostGateway, RestCommandSink, live_snapshot};
pub use render::{View, ViewMode};
pub use store::{ConfigStore, LiveStateCache};

pub use model::{
    Configuration, EntityId, EntityKind, EntityRef, LiveEntityState, LiveSnapshot, Room, RoomId,
    Styles,
};
