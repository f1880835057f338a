use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    /// The root or a referenced item does not exist, is not visible, or the
    /// root is not a folder.
    #[error("Remote item {id} not found: {message}")]
    NotFound { id: String, message: String },

    #[error("Remote unavailable: {operation} for {id} failed after {attempts} attempts: {message}")]
    RemoteUnavailable {
        operation: String,
        id: String,
        attempts: u32,
        message: String,
    },

    #[error("Failed to {operation} {}: {message}", path.display())]
    LocalIo {
        operation: String,
        path: PathBuf,
        message: String,
    },

    /// Non-retryable remote failure (authentication, malformed response)
    #[error("Provider error during {operation} for {id}: {message}")]
    Provider {
        operation: String,
        id: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MirrorError {
    pub(crate) fn local_io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl ToString,
    ) -> Self {
        MirrorError::LocalIo {
            operation: operation.into(),
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<core_runtime::Error> for MirrorError {
    fn from(error: core_runtime::Error) -> Self {
        MirrorError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
