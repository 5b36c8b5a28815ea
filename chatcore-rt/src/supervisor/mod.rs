//! Parent/child bookkeeping for cascading graceful stop.

mod tree;
mod types;

pub use tree::SupervisorTree;
pub use types::{ChildSpec, RestartPolicy, ShutdownPolicy};
