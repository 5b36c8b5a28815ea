//! # chatcore-hub — fan-out service facade
//!
//! The one component that owns the actor fabric's cluster handle: a
//! [`Hub`] spawns, addresses, and routes between User/Server/Channel actors
//! (`chatcore-actors`) across the regions configured at startup, and is the
//! only thing in the workspace that implements
//! [`chatcore_actors::HubHandle`] — resolving the cyclic hub/actor
//! dependency by injecting the hub into the actors as a narrow capability
//! rather than the other way around (see `HubHandle`'s own docs).
//!
//! `chatcore-gateway` and `chatcore-node` talk to a [`Hub`] through its
//! public methods; they never reach into `chatcore-rt` or `chatcore-actors`
//! directly.

mod error;
mod hub;

pub use error::HubError;
pub use hub::Hub;
