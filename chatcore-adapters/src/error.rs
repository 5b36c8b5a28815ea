use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record found")]
    NotFound,
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.kind() == redis::ErrorKind::TypeError {
            StoreError::NotFound
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}
