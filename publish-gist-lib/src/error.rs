//! Defines custom error types for the library.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
/// Error type returned when publishing a gist fails.
pub enum PublishError {
    #[error("'{0}' is required but not found.")]
    MissingTool(String),

    #[error("Not authenticated with gh. Run 'gh auth login' first.")]
    NotAuthenticated,

    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// `stderr` holds a single line: the last non-empty one, or the exit status.
    #[error("Command failed: {command}: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Failed to launch '{command}'")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected response from gh: {0}")]
    UnexpectedCreateResponse(String),

    #[error("Unexpected gist metadata: {0}")]
    MalformedMetadata(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        PublishError::Io(err.to_string())
    }
}
