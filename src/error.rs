use crate::collection::CollectionError;
use boxhaul_fetch::{scrub_credentials, FetchError};
use boxhaul_metadata::SelectError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything the add pipeline can fail with. No kind is recovered locally;
/// all surface to the caller. Every message that can echo a URL is built
/// from credential-scrubbed text.
#[derive(Debug, Error)]
pub enum AddError {
    #[error("a download of this box is already in progress; wait for it to finish or remove {}", lock_path.display())]
    DownloadAlreadyInProgress { lock_path: PathBuf },

    #[error("box download failed: {message}")]
    Downloader { message: String },

    #[error("could not load box metadata from {url}: {message}")]
    MetadataDownload { url: String, message: String },

    #[error("a name is required when adding a box from a direct file or URL")]
    NameRequired,

    #[error("a version constraint cannot be set when adding a box from a direct file or URL; direct boxes are always version \"0\"")]
    DirectVersion,

    #[error("box {name} (v{version}, {provider}) is already installed; pass force to replace it")]
    AlreadyExists {
        name: String,
        provider: String,
        version: String,
    },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("unknown checksum type: {0}")]
    UnknownChecksumKind(String),

    #[error("no box server is configured; set a server URL or use a full box URL")]
    ServerNotSet,

    #[error("box {shorthand} could not be found on {server}")]
    ShortNotFound { shorthand: String, server: String },

    #[error("a metadata document cannot be added alongside other box URLs: {url}")]
    MetadataMultiUrl { url: String },

    #[error("the requested box name {requested} does not match the name {actual} in the metadata")]
    NameMismatch { requested: String, actual: String },

    #[error("box {name} has no version satisfying the constraint {constraint}")]
    NoMatchingVersion { name: String, constraint: String },

    #[error("box {name} has no provider matching {requested}")]
    NoMatchingProvider { name: String, requested: String },

    #[error("invalid version constraint: {0}")]
    InvalidVersionConstraint(String),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<FetchError> for AddError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::AlreadyInProgress { lock_path } => {
                AddError::DownloadAlreadyInProgress { lock_path }
            }
            other => AddError::Downloader {
                message: scrub_credentials(&other.to_string()),
            },
        }
    }
}

impl From<SelectError> for AddError {
    fn from(e: SelectError) -> Self {
        match e {
            SelectError::NoMatchingVersion { name, constraint } => {
                AddError::NoMatchingVersion { name, constraint }
            }
            SelectError::NoMatchingProvider { name, requested } => {
                AddError::NoMatchingProvider { name, requested }
            }
        }
    }
}
