use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::error::BrokerError;
use super::registry::ActorRegistry;
use super::traits::MessageBroker;
use crate::message::{Message, MessageEnvelope};
use crate::util::Pid;

struct Inner<M: Message> {
    registry: ActorRegistry<M>,
    pending: DashMap<Uuid, oneshot::Sender<M>>,
}

/// The default, single-process [`MessageBroker`] implementation: actors are
/// looked up in an in-memory registry and `request` is implemented with a
/// correlation-id-keyed `oneshot` channel.
pub struct InMemoryMessageBroker<M: Message> {
    inner: Arc<Inner<M>>,
}

impl<M: Message> Clone for InMemoryMessageBroker<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Message> InMemoryMessageBroker<M> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: ActorRegistry::new(),
                pending: DashMap::new(),
            }),
        }
    }

    async fn deliver(&self, target: &Pid, envelope: MessageEnvelope<M>) -> Result<(), BrokerError> {
        let sender = self.inner.registry.get(target).ok_or(BrokerError::NotFound)?;
        sender.send(envelope).await.map_err(|_| BrokerError::SendFailed)
    }
}

impl<M: Message> Default for InMemoryMessageBroker<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: Message> MessageBroker<M> for InMemoryMessageBroker<M> {
    async fn send(&self, target: &Pid, payload: M) -> Result<(), BrokerError> {
        self.deliver(target, MessageEnvelope::new(payload)).await
    }

    async fn send_with_sender(
        &self,
        target: &Pid,
        payload: M,
        sender: Pid,
    ) -> Result<(), BrokerError> {
        self.deliver(target, MessageEnvelope::new(payload).with_sender(sender))
            .await
    }

    async fn request(&self, target: &Pid, payload: M, timeout: Duration) -> Result<M, BrokerError> {
        let correlation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(correlation_id, tx);

        let envelope = MessageEnvelope::new(payload).with_correlation_id(correlation_id);
        if let Err(e) = self.deliver(target, envelope).await {
            self.inner.pending.remove(&correlation_id);
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(BrokerError::SendFailed),
            Err(_) => {
                self.inner.pending.remove(&correlation_id);
                Err(BrokerError::Timeout)
            }
        }
    }

    fn reply(&self, correlation_id: Uuid, payload: M) {
        if let Some((_, tx)) = self.inner.pending.remove(&correlation_id) {
            let _ = tx.send(payload);
        }
    }

    fn registry(&self) -> &ActorRegistry<M> {
        &self.inner.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{BackpressureStrategy, BoundedMailbox, MailboxReceiver};
    use crate::util::{ActorPath, NodeId};

    #[derive(Debug, Clone, PartialEq)]
    enum TestMessage {
        Ping,
        Pong,
    }

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "test";
    }

    fn pid(id: &str) -> Pid {
        Pid::new(
            NodeId::new("node-1"),
            ActorPath::User {
                user_id: id.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn send_to_unknown_pid_errors_not_found() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let err = broker.send(&pid("ghost"), TestMessage::Ping).await.unwrap_err();
        assert_eq!(err, BrokerError::NotFound);
    }

    #[tokio::test]
    async fn send_delivers_to_registered_mailbox() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let (tx, mut rx) = BoundedMailbox::channel::<TestMessage>(4, BackpressureStrategy::Block);
        let target = pid("u1");
        broker.registry().register(target.clone(), tx);

        broker.send(&target, TestMessage::Ping).await.unwrap();
        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.payload, TestMessage::Ping);
    }

    #[tokio::test]
    async fn request_resolves_when_reply_called() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let (tx, mut rx) = BoundedMailbox::channel::<TestMessage>(4, BackpressureStrategy::Block);
        let target = pid("u1");
        broker.registry().register(target.clone(), tx);

        let broker_for_responder = broker.clone();
        let responder = tokio::spawn(async move {
            let envelope = rx.recv().await.unwrap();
            let correlation_id = envelope.correlation_id.unwrap();
            broker_for_responder.reply(correlation_id, TestMessage::Pong);
        });

        let reply = broker
            .request(&target, TestMessage::Ping, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply, TestMessage::Pong);
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn request_times_out_when_no_reply() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let (tx, _rx) = BoundedMailbox::channel::<TestMessage>(4, BackpressureStrategy::Block);
        let target = pid("u1");
        broker.registry().register(target.clone(), tx);

        let err = broker
            .request(&target, TestMessage::Ping, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err, BrokerError::Timeout);
    }
}
