use async_trait::async_trait;

use super::context::ActorContext;
use crate::broker::MessageBroker;
use crate::message::Message;

/// What the runtime does after an actor's `handle_message` or lifecycle hook
/// returns an error.
///
/// There is deliberately no `Restart` variant: nothing in this domain
/// restarts a crashed actor automatically — the owning node stops it and
/// callers re-activate on demand (see `ActorSystem::activate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Stop this actor; its children are stopped transitively.
    Stop,
    /// Log the error and keep processing the mailbox.
    Resume,
    /// Stop this actor and propagate the failure to its parent/supervisor.
    Escalate,
}

/// One unit of execution in the actor fabric: a private state plus a
/// receive function invoked exactly once per mailbox message.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use chatcore_rt::actor::{Actor, ActorContext, ErrorAction};
/// use chatcore_rt::broker::InMemoryMessageBroker;
/// use chatcore_rt::message::Message;
///
/// #[derive(Debug, Clone)]
/// enum PingMessage { Ping }
/// impl Message for PingMessage {
///     const MESSAGE_TYPE: &'static str = "ping";
/// }
///
/// struct PingActor { count: u32 }
///
/// #[async_trait::async_trait]
/// impl Actor for PingActor {
///     type Message = PingMessage;
///     type Broker = InMemoryMessageBroker<PingMessage>;
///     type Error = std::convert::Infallible;
///
///     async fn handle_message(
///         &mut self,
///         _msg: Self::Message,
///         _ctx: &mut ActorContext<Self::Message, Self::Broker>,
///     ) -> Result<(), Self::Error> {
///         self.count += 1;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Actor: Send + 'static {
    type Message: Message;
    type Broker: MessageBroker<Self::Message>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once before the first message is delivered.
    async fn pre_start(
        &mut self,
        _ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every mailbox message, exactly one at a time.
    async fn handle_message(
        &mut self,
        msg: Self::Message,
        ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error>;

    /// Called once after the mailbox is drained and the actor is stopping.
    async fn post_stop(
        &mut self,
        _ctx: &mut ActorContext<Self::Message, Self::Broker>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when `handle_message`, `pre_start`, or `post_stop` returns an
    /// error. The default policy stops the actor.
    fn on_error(&mut self, _error: &Self::Error) -> ErrorAction {
        ErrorAction::Stop
    }
}
