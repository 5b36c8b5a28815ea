use dashmap::DashMap;

use crate::mailbox::BoundedMailboxSender;
use crate::message::Message;
use crate::util::Pid;

/// A concurrent map from a locally-active actor's [`Pid`] to the sending
/// half of its mailbox.
///
/// Registration is local to one node/`ActorSystem`: cross-node resolution
/// goes through `chatcore_rt::cluster::ClusterDirectory` instead.
pub struct ActorRegistry<M: Message> {
    senders: DashMap<Pid, BoundedMailboxSender<M>>,
}

impl<M: Message> ActorRegistry<M> {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    pub fn register(&self, pid: Pid, sender: BoundedMailboxSender<M>) {
        self.senders.insert(pid, sender);
    }

    pub fn unregister(&self, pid: &Pid) {
        self.senders.remove(pid);
    }

    pub fn get(&self, pid: &Pid) -> Option<BoundedMailboxSender<M>> {
        self.senders.get(pid).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, pid: &Pid) -> bool {
        self.senders.contains_key(pid)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl<M: Message> Default for ActorRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}
