use thiserror::Error;

/// The hub's own error boundary. Narrower than the sum of
/// every lower-layer error type: lookup misses and fan-out absorption never
/// surface here, only the handful of operations a caller must itself react
/// to (an unresolvable region, a request that didn't answer in time, or an
/// unexpected failure bubbling up from the actor fabric).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("{0}")]
    NotFound(String),
    #[error("request timed out waiting for a reply")]
    Timeout,
    #[error("{0}")]
    Upstream(String),
}

impl From<chatcore_rt::SystemError> for HubError {
    fn from(err: chatcore_rt::SystemError) -> Self {
        HubError::Upstream(err.to_string())
    }
}

impl From<chatcore_actors::GetServerUsersError> for HubError {
    fn from(err: chatcore_actors::GetServerUsersError) -> Self {
        match err {
            chatcore_actors::GetServerUsersError::Timeout => HubError::Timeout,
            chatcore_actors::GetServerUsersError::Dead => HubError::Upstream(err.to_string()),
        }
    }
}
