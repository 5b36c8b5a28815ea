// Layer 1: Standard library
use std::fmt::Debug;

// Layer 2: Third-party
use chrono::{DateTime, Utc};
use uuid::Uuid;

// Layer 3: Internal
use super::traits::Message;
use crate::util::Pid;

/// Generic message envelope: a payload plus routing metadata.
///
/// The envelope is generic over the message type `M`, giving compile-time
/// type safety without runtime dispatch or type erasure.
///
/// # Example
/// ```rust
/// use chatcore_rt::message::{Message, MessageEnvelope};
///
/// #[derive(Debug, Clone)]
/// struct Ping;
///
/// impl Message for Ping {
///     const MESSAGE_TYPE: &'static str = "ping";
/// }
///
/// let envelope = MessageEnvelope::new(Ping);
/// assert_eq!(envelope.message_type(), "ping");
/// ```
#[derive(Debug, Clone)]
pub struct MessageEnvelope<M: Message> {
    /// The actual message payload.
    pub payload: M,

    /// The actor that sent this envelope, if any (used for reply routing).
    pub sender: Option<Pid>,

    /// When this envelope was created.
    pub timestamp: DateTime<Utc>,

    /// Correlation id used to match a `request`'s reply to its caller.
    pub correlation_id: Option<Uuid>,
}

impl<M: Message> MessageEnvelope<M> {
    /// Create a new envelope with no sender and no correlation id.
    pub fn new(payload: M) -> Self {
        Self {
            payload,
            sender: None,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Builder method: attach a sender PID for reply routing.
    pub fn with_sender(mut self, sender: Pid) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Builder method: attach a correlation id for request/reply matching.
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// The payload's stable type name.
    pub fn message_type(&self) -> &'static str {
        M::MESSAGE_TYPE
    }
}
