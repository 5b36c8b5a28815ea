use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("target actor is not registered")]
    NotFound,
    #[error("request timed out waiting for a reply")]
    Timeout,
    #[error("failed to deliver to target's mailbox")]
    SendFailed,
}
