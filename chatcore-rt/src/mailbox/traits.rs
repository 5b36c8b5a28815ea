use async_trait::async_trait;
use thiserror::Error;

use crate::message::{Message, MessageEnvelope};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailboxError {
    #[error("mailbox is closed")]
    Closed,
    #[error("mailbox is full")]
    Full,
}

/// The sending half of an actor's mailbox.
#[async_trait]
pub trait MailboxSender<M: Message>: Send + Sync {
    async fn send(&self, envelope: MessageEnvelope<M>) -> Result<(), MailboxError>;

    /// Non-blocking send; used by broadcast loops that must never stall.
    fn try_send(&self, envelope: MessageEnvelope<M>) -> Result<(), MailboxError>;
}

/// The receiving half of an actor's mailbox.
#[async_trait]
pub trait MailboxReceiver<M: Message>: Send {
    async fn recv(&mut self) -> Option<MessageEnvelope<M>>;
}
