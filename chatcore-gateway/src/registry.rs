use std::collections::HashMap;

use chatcore_rt::Pid;
use parking_lot::RwLock;

/// The process-wide `conn -> PID` map, keyed by `userID` since the core
/// maintains at most one live connection per user. Guarded by a single
/// reader-writer lock whose lifetime equals the gateway's; the only path
/// that ever erases an entry is `OnClose` (see [`crate::ws::ws_upgrade`]).
#[derive(Default)]
pub struct ConnRegistry {
    conns: RwLock<HashMap<String, Pid>>,
}

impl ConnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: String, pid: Pid) {
        self.conns.write().insert(user_id, pid);
    }

    pub fn remove(&self, user_id: &str) -> Option<Pid> {
        self.conns.write().remove(user_id)
    }

    pub fn get(&self, user_id: &str) -> Option<Pid> {
        self.conns.read().get(user_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.conns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
