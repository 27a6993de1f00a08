//! Error Handling Module
//!
//! Defines custom error types for the lasplit library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for lasplit operations
#[derive(Error, Debug)]
pub enum LasplitError {
    /// Path does not exist or is not a directory
    #[error("Path not found or not a directory: '{0}' - check the path and try again")]
    NotFound(PathBuf),

    /// Dataset root has no subdirectories to classify
    #[error("No subdirectories under '{0}' - a dataset root must contain at least one class folder")]
    EmptyDataset(PathBuf),

    /// Split ratios are out of range or do not sum to 1.0
    #[error("Invalid split ratios: {0} - ratios must be non-negative and sum to 1.0")]
    InvalidRatio(String),

    /// The classified layout cannot be split
    #[error("Unsupported layout for splitting: {0}")]
    UnsupportedLayout(String),

    /// Destination already contains files at computed target paths
    #[error("Destination conflict: {count} target file(s) already exist (first: '{first}') - pass --overwrite to replace them")]
    DestinationConflict {
        /// Number of conflicting target paths
        count: usize,
        /// First conflicting path, for the error message
        first: PathBuf,
    },

    /// Move-mode materialization was interrupted after some files completed
    #[error("Partial write during move: {completed} file(s) already moved before '{failed}' failed: {reason}")]
    PartialWrite {
        /// Number of files fully moved before the failure
        completed: usize,
        /// The file whose move failed
        failed: PathBuf,
        /// Underlying failure description
        reason: String,
    },

    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LasplitError {
    fn from(err: serde_json::Error) -> Self {
        LasplitError::Serialization(err.to_string())
    }
}

/// Convenience Result type for lasplit operations
pub type Result<T> = std::result::Result<T, LasplitError>;
