use thiserror::Error;

/// Raised by [`crate::HubHandle::get_server_users`]: the one synchronous,
/// fallible call an actor body makes into a different actor kind.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GetServerUsersError {
    #[error("parent server actor did not reply within the deadline")]
    Timeout,
    #[error("parent server actor is not active")]
    Dead,
}

/// Raised by [`crate::OutboundSink::send`] when a bound websocket can no
/// longer accept frames. Chronic failure here is what eventually stops a
/// `UserActor`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    #[error("outbound sink is closed")]
    Closed,
}
