use std::time::Duration;

use async_trait::async_trait;

use super::error::BrokerError;
use super::registry::ActorRegistry;
use crate::message::Message;
use crate::util::Pid;

/// Routes messages between locally-registered actors by [`Pid`].
///
/// A broker instance is shared (cloned cheaply) by every actor in one
/// `ActorSystem`; it never crosses actor-kind boundaries — that is the
/// hub's job (see `chatcore-hub`).
#[async_trait]
pub trait MessageBroker<M: Message>: Send + Sync + Clone + 'static {
    /// Best-effort, fire-and-forget delivery with no sender attached.
    async fn send(&self, target: &Pid, payload: M) -> Result<(), BrokerError>;

    /// As [`MessageBroker::send`], attaching a sender PID for reply routing.
    async fn send_with_sender(
        &self,
        target: &Pid,
        payload: M,
        sender: Pid,
    ) -> Result<(), BrokerError>;

    /// One-shot request/response: sends `payload` to `target` and waits for
    /// that actor to call `ActorContext::reply` with a value, or for
    /// `timeout` to elapse first.
    async fn request(&self, target: &Pid, payload: M, timeout: Duration) -> Result<M, BrokerError>;

    /// Fulfil a pending `request` identified by `correlation_id`. Called by
    /// `ActorContext::reply`, not directly by actor code.
    fn reply(&self, correlation_id: uuid::Uuid, payload: M);

    /// The local registry this broker delivers through. `ActorSystem` uses
    /// this to register and unregister mailboxes as actors spawn and stop.
    fn registry(&self) -> &ActorRegistry<M>;
}
