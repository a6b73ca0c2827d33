//! Error types for phototidy

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for phototidy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for phototidy
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A metadata source had nothing usable. Soft: the resolver moves on
    /// to the next source.
    #[error("No usable metadata in {path}: {message}")]
    MetadataUnavailable { path: PathBuf, message: String },

    #[error("Could not determine capture time of {path}: {message}")]
    TimeUnavailable { path: PathBuf, message: String },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Target file {path} already exists")]
    TargetExists { path: PathBuf },

    /// The `_001` slot was already taken while renumbering an unsuffixed
    /// occupant, so the sequencing invariant is already broken on disk.
    #[error("Cannot rename {from} to {to}: target already exists")]
    RenameConflict { from: PathBuf, to: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn metadata_unavailable(path: &std::path::Path, message: impl Into<String>) -> Self {
        Error::MetadataUnavailable {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
