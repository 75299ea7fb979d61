use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChecksumError>;

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("unknown checksum type: {0}")]
    UnknownKind(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
