//! Error types for the sitefs crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while hashing or staging a site tree
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path does not exist
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Failed to hash file
    #[error("failed to hash file {}: {source}", .path.display())]
    HashFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy a file into the staging area
    #[error("failed to stage {}: {source}", .path.display())]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to walk the site tree
    #[error("failed to walk {}: {message}", .root.display())]
    Walk { root: PathBuf, message: String },

    /// Invalid exclude pattern
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Relative path escapes the site root or is otherwise unusable
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for sitefs operations
pub type Result<T> = std::result::Result<T, Error>;
