use std::time::Duration;

use uuid::Uuid;

use crate::broker::{BrokerError, MessageBroker};
use crate::message::Message;
use crate::util::Pid;

/// What an actor sees of the runtime while handling one message: its own
/// address, its parent (if it was spawned as a child), and the broker used
/// to talk to other actors of the same kind.
pub struct ActorContext<M: Message, B: MessageBroker<M>> {
    pid: Pid,
    parent: Option<Pid>,
    broker: B,
    /// Set by the dispatch loop immediately before `handle_message` is
    /// called with a message that expects a reply; cleared afterward.
    pending_reply: Option<Uuid>,
    _marker: std::marker::PhantomData<M>,
}

impl<M: Message, B: MessageBroker<M>> ActorContext<M, B> {
    pub fn new(pid: Pid, parent: Option<Pid>, broker: B) -> Self {
        Self {
            pid,
            parent,
            broker,
            pending_reply: None,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn parent(&self) -> Option<&Pid> {
        self.parent.as_ref()
    }

    /// Fire-and-forget send to another actor of the same kind.
    pub async fn send(&self, target: &Pid, payload: M) -> Result<(), BrokerError> {
        self.broker.send_with_sender(target, payload, self.pid.clone()).await
    }

    /// One-shot request/response with an explicit deadline.
    pub async fn request(
        &self,
        target: &Pid,
        payload: M,
        timeout: Duration,
    ) -> Result<M, BrokerError> {
        self.broker.request(target, payload, timeout).await
    }

    /// Used by the dispatch loop to mark the correlation id of the message
    /// about to be handled, if any.
    pub(crate) fn set_pending_reply(&mut self, correlation_id: Option<Uuid>) {
        self.pending_reply = correlation_id;
    }

    /// Reply to the current message's requester, if it was sent via
    /// `request`. A no-op if the current message was a plain `send`.
    pub fn reply(&mut self, payload: M) {
        if let Some(correlation_id) = self.pending_reply.take() {
            self.broker.reply(correlation_id, payload);
        }
    }
}
