//! # chatcore-actors — User/Server/Channel actor bodies
//!
//! Implements the three domain actor kinds — user, server, and channel —
//! on top of `chatcore-rt`'s generic `Actor`/`ActorContext`. Cross-kind work
//! (a channel asking its parent server for the online set, a server spawning
//! a channel child, any directory lookup) goes through the narrow
//! [`HubHandle`] capability rather than a direct dependency on
//! `chatcore-hub`, which implements it — keeping the dependency graph
//! acyclic (see [`HubHandle`]'s own docs).

mod channel;
mod error;
mod hub_handle;
mod server;
mod sink;
mod user;

pub use channel::{ChannelActor, ChannelMessage};
pub use error::{GetServerUsersError, SinkError};
pub use hub_handle::{ChannelSpawnSpec, HubHandle};
pub use server::{ModerationKind, ServerActor, ServerMessage};
pub use sink::OutboundSink;
pub use user::{UserActor, UserMessage};

/// Test doubles re-exported so `chatcore-hub` and `chatcore-gateway` can
/// exercise their own tests against the same trait boundaries.
pub mod testing {
    pub use crate::sink::testing::RecordingSink;
}
