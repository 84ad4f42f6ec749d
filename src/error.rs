//! QQL Studio error types

use std::path::PathBuf;
use thiserror::Error;

/// QQL Studio error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request input (bad seed, bad width, missing field)
    #[error("{0}")]
    InvalidInput(String),

    /// The configured CLI executable does not exist
    #[error("qql-cli not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// The CLI ran but exited unsuccessfully
    #[error("{message}")]
    ProcessFailure {
        /// Human readable failure, usually the captured stderr
        message: String,
        /// Captured stdout of the failed run
        output: String,
    },

    /// The CLI was killed after exceeding its deadline
    #[error("{message}")]
    Timeout {
        /// Captured stderr including the timeout marker
        message: String,
        /// Captured stdout up to the moment of termination
        output: String,
    },

    /// No artifact or image matches the request
    #[error("{0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Output captured from the external process, if this error carries any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Error::ProcessFailure { output, .. } | Error::Timeout { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

/// Result type alias for QQL Studio operations
pub type Result<T> = std::result::Result<T, Error>;
