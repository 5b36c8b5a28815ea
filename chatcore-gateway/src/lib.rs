//! # chatcore-gateway — websocket gateway
//!
//! Upgrades authenticated HTTP sessions to websockets, binds each one to a
//! freshly spawned `UserActor` via [`chatcore_hub::Hub::create_user`], and
//! enforces the heartbeat protocol and single-writer discipline. This is
//! the only crate in the workspace that touches a live socket.

mod error;
mod registry;
mod router;
mod sink;
mod state;
mod ws;

pub use error::GatewayError;
pub use registry::ConnRegistry;
pub use router::build_router;
pub use state::GatewayState;
pub use ws::{ws_upgrade, PING_INTERVAL, PING_WAIT};
