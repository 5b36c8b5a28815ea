use async_trait::async_trait;
use tokio::sync::mpsc;

use super::backpressure::BackpressureStrategy;
use super::traits::{MailboxError, MailboxReceiver, MailboxSender};
use crate::message::{Message, MessageEnvelope};

/// A bounded, FIFO mailbox backed by a `tokio::sync::mpsc` channel.
///
/// # Example
/// ```rust
/// use chatcore_rt::mailbox::{BoundedMailbox, BackpressureStrategy, MailboxSender};
/// use chatcore_rt::message::{Message, MessageEnvelope};
///
/// #[derive(Debug, Clone)]
/// struct Ping;
/// impl Message for Ping {
///     const MESSAGE_TYPE: &'static str = "ping";
/// }
///
/// # tokio_test::block_on(async {
/// let (tx, mut rx) = BoundedMailbox::<Ping>::channel(4, BackpressureStrategy::Block);
/// tx.send(MessageEnvelope::new(Ping)).await.unwrap();
/// use chatcore_rt::mailbox::MailboxReceiver;
/// assert!(rx.recv().await.is_some());
/// # });
/// ```
pub struct BoundedMailboxSender<M: Message> {
    tx: mpsc::Sender<MessageEnvelope<M>>,
    strategy: BackpressureStrategy,
}

impl<M: Message> Clone for BoundedMailboxSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            strategy: self.strategy,
        }
    }
}

pub struct BoundedMailboxReceiver<M: Message> {
    rx: mpsc::Receiver<MessageEnvelope<M>>,
}

pub struct BoundedMailbox;

impl BoundedMailbox {
    /// Create a linked sender/receiver pair with the given capacity and
    /// full-mailbox behavior.
    pub fn channel<M: Message>(
        capacity: usize,
        strategy: BackpressureStrategy,
    ) -> (BoundedMailboxSender<M>, BoundedMailboxReceiver<M>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            BoundedMailboxSender { tx, strategy },
            BoundedMailboxReceiver { rx },
        )
    }
}

#[async_trait]
impl<M: Message> MailboxSender<M> for BoundedMailboxSender<M> {
    async fn send(&self, envelope: MessageEnvelope<M>) -> Result<(), MailboxError> {
        match self.strategy {
            BackpressureStrategy::Block => {
                self.tx.send(envelope).await.map_err(|_| MailboxError::Closed)
            }
            BackpressureStrategy::DropNewest => match self.tx.try_send(envelope) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(_)) => Ok(()),
                Err(mpsc::error::TrySendError::Closed(_)) => Err(MailboxError::Closed),
            },
            BackpressureStrategy::Reject => self.try_send(envelope),
        }
    }

    fn try_send(&self, envelope: MessageEnvelope<M>) -> Result<(), MailboxError> {
        self.tx.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => MailboxError::Full,
            mpsc::error::TrySendError::Closed(_) => MailboxError::Closed,
        })
    }
}

#[async_trait]
impl<M: Message> MailboxReceiver<M> for BoundedMailboxReceiver<M> {
    async fn recv(&mut self) -> Option<MessageEnvelope<M>> {
        self.rx.recv().await
    }
}
