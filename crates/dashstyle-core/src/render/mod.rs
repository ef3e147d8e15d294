//! Pure renderers: `(document, live cache, view mode) → UI tree`.

pub mod admin_view;
pub mod main_view;
pub mod policy;
pub mod tree;

use serde::Serialize;
use strum::Display;

use crate::admin::AdminUi;
use crate::store::{ConfigStore, LiveStateCache};

pub use admin_view::build_admin_view;
pub use main_view::{build_main_view, patch_main_view};
pub use tree::{AdminView, Availability, Card, MainView, RoomSection, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Main,
    Admin,
}

/// Render whichever view `mode` selects. The admin branch never reads
/// `cache`.
pub fn render(store: &ConfigStore, cache: &LiveStateCache, mode: ViewMode, ui: &AdminUi) -> View {
    match mode {
        ViewMode::Main => View::Main(build_main_view(store, cache)),
        ViewMode::Admin => View::Admin(build_admin_view(store, ui)),
    }
}
