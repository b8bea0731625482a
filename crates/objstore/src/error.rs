use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Object or local source not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Destination string could not be parsed
    #[error("invalid destination '{0}' (expected s3://bucket[/prefix] or file:///dir)")]
    InvalidDestination(String),

    /// Object key is empty or escapes the destination
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// Invalid include/exclude pattern
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A directory was uploaded without a recursive copy
    #[error("{} is a directory; directory uploads must be recursive", .0.display())]
    NotRecursive(PathBuf),

    /// s3cmd exited with a failure status
    #[error("command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    /// s3cmd binary could not be executed
    #[error("s3cmd not found at {} - install it or set [s3cmd] binary", .0.display())]
    S3cmdNotFound(PathBuf),

    /// Access to the bucket or object was denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the backend itself is unusable (not just one object)
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::S3cmdNotFound(_) | Error::PermissionDenied(_))
    }
}

/// Result type for object store operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = Error::NotFound("site/.checksums".to_string());
        assert!(missing.is_not_found());
        assert!(!missing.is_unavailable());

        let no_binary = Error::S3cmdNotFound(PathBuf::from("s3cmd"));
        assert!(no_binary.is_unavailable());
        assert!(!no_binary.is_not_found());

        let failed = Error::CommandFailed {
            command: "s3cmd del s3://b/x".to_string(),
            stderr: "ERROR: boom".to_string(),
        };
        assert!(!failed.is_not_found());
        assert!(failed.to_string().contains("ERROR: boom"));
    }
}
