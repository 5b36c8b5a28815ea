use thiserror::Error;

use chatcore_adapters::StoreError;

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("no cached session for this token")]
    SessionNotFound,
    #[error("cached session payload is not valid json: {0}")]
    MalformedSession(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
