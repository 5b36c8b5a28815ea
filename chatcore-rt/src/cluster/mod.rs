//! Multi-node routing, simulated honestly within one process: a
//! [`ClusterDirectory`] resolves where an actor lives, a [`RegionTable`]
//! assigns regions to nodes, and [`ClusterNode`] dispatches to whichever
//! `ActorSystem` (local or peer) currently hosts the target.

mod directory;
mod error;
mod node;
mod region_table;

pub use directory::{ClusterDirectory, InMemoryDirectory};
pub use error::ClusterError;
pub use node::ClusterNode;
pub use region_table::RegionTable;
