use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid metadata document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid version: {0}")]
    Version(String),

    #[error("invalid version constraint: {0}")]
    Constraint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("box {name} has no version satisfying the constraint {constraint}")]
    NoMatchingVersion { name: String, constraint: String },

    #[error("box {name} has no provider matching {requested}")]
    NoMatchingProvider { name: String, requested: String },
}
