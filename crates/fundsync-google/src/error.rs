//! Error types for the Google adapters.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google token not found at {0}")]
    TokenNotFound(PathBuf),

    #[error("invalid Google token file {path}: {message}")]
    InvalidToken { path: PathBuf, message: String },

    #[error("Google token expired or revoked; re-authorize and replace the token file")]
    AuthExpired,

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl GoogleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TokenNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, GoogleError>;

/// A report upload that did not succeed. Uploads are never retried.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Auth(#[from] GoogleError),

    #[error("Drive rejected upload with {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("upload transport error: {0}")]
    Transport(String),

    #[error("unexpected Drive response: {0}")]
    Decode(String),
}
