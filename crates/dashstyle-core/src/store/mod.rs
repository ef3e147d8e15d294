pub mod config_store;
pub mod live_state;

pub use config_store::ConfigStore;
pub use live_state::LiveStateCache;
