//! # chatcore-rt — actor runtime for chat fan-out
//!
//! A lightweight, type-safe actor runtime: one [`system::ActorSystem`] per
//! actor kind, intra-kind request/reply via [`broker::MessageBroker`], and
//! an in-process multi-node simulation in [`cluster`] for region-aware
//! routing without a real network transport.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chatcore_rt::prelude::*;
//! use async_trait::async_trait;
//!
//! #[derive(Debug, Clone)]
//! enum CounterMsg {
//!     Increment,
//! }
//!
//! impl Message for CounterMsg {
//!     const MESSAGE_TYPE: &'static str = "counter";
//! }
//!
//! struct CounterActor {
//!     count: u64,
//! }
//!
//! #[async_trait]
//! impl Actor for CounterActor {
//!     type Message = CounterMsg;
//!     type Broker = InMemoryMessageBroker<CounterMsg>;
//!     type Error = std::convert::Infallible;
//!
//!     async fn handle_message(
//!         &mut self,
//!         msg: Self::Message,
//!         _ctx: &mut ActorContext<Self::Message, Self::Broker>,
//!     ) -> Result<(), Self::Error> {
//!         match msg {
//!             CounterMsg::Increment => self.count += 1,
//!         }
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Module Organization
//!
//! ## Core actor system
//! - [`actor`] - the `Actor` trait, lifecycle hooks, and `ActorContext`
//! - [`message`] - the `Message` trait and `MessageEnvelope`
//! - [`mailbox`] - bounded per-actor mailboxes with backpressure
//! - [`broker`] - intra-kind routing and request/reply correlation
//!
//! ## Fault handling
//! - [`supervisor`] - parent/child bookkeeping for cascading graceful stop
//!
//! ## Infrastructure
//! - [`system`] - `ActorSystem`, its configuration, and spawn/poison lifecycle
//! - [`cluster`] - multi-node directory, region table, and routing
//! - [`util`] - addressing primitives (`Pid`, `ActorPath`, `NodeId`, `Region`)
//!
//! # Design notes
//!
//! There is deliberately no `Restart` error action and no generic crash
//! supervision: nothing in this domain automatically restarts a crashed
//! actor with fresh state. A stopped actor is reactivated on demand by
//! whichever layer needed it (see `chatcore-hub`).

pub mod actor;
pub mod broker;
pub mod cluster;
pub mod mailbox;
pub mod message;
pub mod supervisor;
pub mod system;
pub mod util;

pub use actor::{Actor, ActorContext, ErrorAction};
pub use broker::{ActorRegistry, BrokerError, InMemoryMessageBroker, MessageBroker};
pub use cluster::{ClusterDirectory, ClusterError, ClusterNode, InMemoryDirectory, RegionTable};
pub use mailbox::{
    BackpressureStrategy, BoundedMailbox, BoundedMailboxReceiver, BoundedMailboxSender,
    MailboxError, MailboxReceiver, MailboxSender,
};
pub use message::{Message, MessageEnvelope};
pub use supervisor::{ChildSpec, RestartPolicy, ShutdownPolicy, SupervisorTree};
pub use system::{ActorSystem, SystemConfig, SystemConfigBuilder, SystemError};
pub use util::{ActorId, ActorKind, ActorPath, MessageId, NodeId, Pid, Region};

/// Convenience re-export of everything needed to implement an `Actor`.
pub mod prelude {
    pub use crate::actor::{Actor, ActorContext, ErrorAction};
    pub use crate::broker::{InMemoryMessageBroker, MessageBroker};
    pub use crate::message::Message;
    pub use crate::system::{ActorSystem, SystemConfig};
    pub use crate::util::{ActorKind, ActorPath, NodeId, Pid, Region};
}
