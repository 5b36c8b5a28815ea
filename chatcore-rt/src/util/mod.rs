//! Addressing primitives shared across the actor runtime.

mod addressing;
mod ids;

pub use addressing::{ActorKind, ActorPath, NodeId, Pid, Region};
pub use ids::{ActorId, MessageId};
