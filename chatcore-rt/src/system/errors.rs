use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("actor {0} is already live")]
    AlreadyExists(String),
    #[error("actor {0} is not active")]
    NotActive(String),
    #[error("invalid system configuration: {0}")]
    InvalidConfig(String),
    #[error("refused to spawn orphan channel: parent {0} does not exist")]
    OrphanChild(String),
}
