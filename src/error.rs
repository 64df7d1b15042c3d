use std::path::PathBuf;

/// Why a metadata record cannot be turned into a destination path.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("missing 'type' metadata")]
    MissingType,
    #[error("unknown frame type '{0}'")]
    UnknownType(String),
    #[error("missing required '{0}' metadata")]
    MissingProperty(String),
    #[error("'{key}' value '{value}' cannot be used as a library path segment")]
    InvalidPathSegment { key: String, value: String },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid metadata for {}: {reason}", .source_file.display())]
    InvalidMetadata {
        source_file: PathBuf,
        reason: MetadataError,
    },
    #[error(
        "found {} colliding destination file(s), run without --no-overwrite to overwrite them",
        .0.len()
    )]
    DestinationCollision(Vec<PathBuf>),
    #[error("failed to copy {}", .source_file.display())]
    CopyFailure {
        source_file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("source directory does not exist: {}", .0.display())]
    InvalidSourceDirectory(PathBuf),
    #[error("invalid file pattern")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
