//! Error types for Google Drive provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Access token missing, expired or revoked (HTTP 401)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned a non-retryable error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit exceeded (HTTP 429, or 403 with a rate-limit reason)
    #[error("Rate limit exceeded (status {status_code}): {message}")]
    RateLimitExceeded { status_code: u16, message: String },

    /// Drive backend error (HTTP 5xx)
    #[error("Google Drive server error (status {status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    /// File, folder or drive not found or not visible to the token
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport error from the HTTP bridge
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

impl GoogleDriveError {
    /// True if the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            GoogleDriveError::RateLimitExceeded { .. } | GoogleDriveError::ServerError { .. } => {
                true
            }
            GoogleDriveError::BridgeError(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::FileNotFound { file_id } => BridgeError::NotFound(file_id),
            e @ (GoogleDriveError::RateLimitExceeded { .. }
            | GoogleDriveError::ServerError { .. }) => BridgeError::Transient(e.to_string()),
            GoogleDriveError::BridgeError(e) => e,
            e => BridgeError::OperationFailed(e.to_string()),
        }
    }
}
