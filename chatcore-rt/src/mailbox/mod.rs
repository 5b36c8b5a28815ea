//! Bounded, FIFO per-actor mailboxes with configurable backpressure.

mod backpressure;
mod bounded;
mod traits;

pub use backpressure::BackpressureStrategy;
pub use bounded::{BoundedMailbox, BoundedMailboxReceiver, BoundedMailboxSender};
pub use traits::{MailboxError, MailboxReceiver, MailboxSender};
