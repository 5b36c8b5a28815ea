use thiserror::Error;

/// Errors raised while encoding or decoding a [`crate::WSMessage`] envelope.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("envelope is truncated: {0}")]
    Truncated(String),

    #[error("unknown wire tag {0}")]
    UnknownTag(u8),

    #[error("payload is not valid utf-8")]
    Utf8,
}
