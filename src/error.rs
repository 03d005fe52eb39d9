use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DockerlibError>;

#[derive(Debug, Error)]
pub enum DockerlibError {
    #[error("malformed version: {0}")]
    MalformedVersion(String),

    #[error("invalid manifest: {0}")]
    Validation(String),

    #[error("unable to resolve version in {}: {reason}", .dir.display())]
    Resolution { dir: PathBuf, reason: String },

    #[error("mismatched versions in {}: expected {expected}, found {actual}", .dir.display())]
    Mismatch {
        dir: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("git {command} exited with {status}: {stderr}")]
    Git {
        command: String,
        status: String,
        stderr: String,
    },
}
