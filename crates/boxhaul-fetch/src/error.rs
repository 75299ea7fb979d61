use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP {status} while fetching {url}")]
    Http { status: u16, url: String },

    #[error("too many redirects ({count}) while fetching {url}")]
    TooManyRedirects { count: u32, url: String },

    #[error("file not found: {0}")]
    MissingFile(PathBuf),

    #[error("another process is downloading this box (lock held at {lock_path})")]
    AlreadyInProgress { lock_path: PathBuf },

    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

impl FetchError {
    /// Transport-level failures: multi-URL fallback advances past these,
    /// while everything else aborts the add immediately.
    pub fn is_transport(&self) -> bool {
        !matches!(self, FetchError::AlreadyInProgress { .. })
    }
}
