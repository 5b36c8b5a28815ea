use dashmap::DashMap;

use super::types::ChildSpec;
use crate::util::Pid;

/// Tracks parent/child relationships between locally-supervised actors so
/// that poisoning a parent cascades to its children first.
///
/// Used within one `ActorSystem` (same actor kind). Cross-kind parenting —
/// a server actor's channel children — is tracked by the server actor's own
/// state and cascaded via the hub capability instead, since server and
/// channel actors live in different `ActorSystem`s (see DESIGN.md).
pub struct SupervisorTree {
    children: DashMap<Pid, Vec<(Pid, ChildSpec)>>,
}

impl SupervisorTree {
    pub fn new() -> Self {
        Self {
            children: DashMap::new(),
        }
    }

    pub fn register_child(&self, parent: Pid, child: Pid, spec: ChildSpec) {
        self.children.entry(parent).or_default().push((child, spec));
    }

    /// All children currently registered under `parent`, most-recently-added
    /// last.
    pub fn children_of(&self, parent: &Pid) -> Vec<Pid> {
        self.children
            .get(parent)
            .map(|entry| entry.value().iter().map(|(pid, _)| pid.clone()).collect())
            .unwrap_or_default()
    }

    /// Remove a parent's bookkeeping entirely, e.g. once all of its children
    /// have been stopped.
    pub fn remove_parent(&self, parent: &Pid) {
        self.children.remove(parent);
    }
}

impl Default for SupervisorTree {
    fn default() -> Self {
        Self::new()
    }
}
