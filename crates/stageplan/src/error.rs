//! Error types for planning and executing deploys

use crate::types::{Operation, PathClass};
use thiserror::Error;

/// Errors raised by the planner and the stage executor.
///
/// Malformed manifest lines are not an error: they are dropped by the
/// snapshot parser and only counted.
#[derive(Debug, Error)]
pub enum Error {
    /// A deploy precondition does not hold; nothing remote has been touched
    #[error("precondition failed: {reason}")]
    Precondition {
        /// What was wrong with the input
        reason: String,
    },

    /// Preparing files in the local staging area failed
    #[error("staging failed at stage {stage} ({class}, {paths} paths): {message}")]
    Staging {
        /// Index of the failing stage in the plan
        stage: usize,
        /// Class of the failing stage
        class: PathClass,
        /// Number of listed paths in the failing stage
        paths: usize,
        /// Collaborator error message
        message: String,
    },

    /// A copy, remove or sync against the remote store failed
    #[error("{operation} failed at stage {stage} ({class}, {paths} paths): {message}")]
    Transfer {
        /// Index of the failing stage in the plan
        stage: usize,
        /// Operation that failed
        operation: Operation,
        /// Class of the failing stage
        class: PathClass,
        /// Number of listed paths in the failing stage
        paths: usize,
        /// Collaborator error message
        message: String,
    },

    /// Changing an object's access level failed
    #[error("set-acl failed at stage {stage} for {key}: {message}")]
    Acl {
        /// Index of the failing stage in the plan
        stage: usize,
        /// Object key whose ACL could not be changed
        key: String,
        /// Collaborator error message
        message: String,
    },
}

impl Error {
    /// Shorthand for a precondition failure
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition {
            reason: reason.into(),
        }
    }

    /// Returns true if the error was raised before any remote mutation
    pub fn is_pre_mutation(&self) -> bool {
        matches!(self, Self::Precondition { .. } | Self::Staging { .. })
    }

    /// Index of the failing stage, if the error came from the executor
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Precondition { .. } => None,
            Self::Staging { stage, .. } | Self::Transfer { stage, .. } | Self::Acl { stage, .. } => {
                Some(*stage)
            }
        }
    }
}

/// Result type for planning and execution
pub type Result<T> = std::result::Result<T, Error>;
