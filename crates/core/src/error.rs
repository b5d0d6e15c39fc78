use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed player identifier: expected 16 bytes, got {len}")]
    MalformedIdentifier { len: usize },

    #[error("invalid player identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid completion event: {0}")]
    InvalidEvent(String),

    #[error("invalid connection config: {0}")]
    InvalidConfig(String),
}
