/// How a bounded mailbox behaves when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureStrategy {
    /// Wait for room (the sender's task suspends).
    Block,
    /// Drop the newly sent message and return `Ok` (used for best-effort
    /// fan-out paths where a slow receiver must never stall a broadcast).
    DropNewest,
    /// Reject the send with [`crate::mailbox::MailboxError::Full`].
    Reject,
}
