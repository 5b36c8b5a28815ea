use thiserror::Error;

/// The gateway's own error boundary. Narrower than
/// the errors it delegates to `chatcore-hub`: everything below this layer
/// is either absorbed (a fan-out miss) or turned into a closed socket.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("failed to upgrade connection to a websocket")]
    Upgrade,
    #[error("unauthenticated websocket upgrade request")]
    Auth,
}
