// dashstyle-api: Async client for the Home Assistant host (WebSocket RPC + REST)

pub mod error;
pub mod protocol;
pub mod rest;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use protocol::{HostState, StateChange, StateMap};
pub use rest::RestClient;
pub use transport::TransportConfig;
pub use websocket::{HostConnection, StateSnapshot};
