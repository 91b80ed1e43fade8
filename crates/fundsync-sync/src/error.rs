//! Error types for contact sync.

use std::time::Duration;

use thiserror::Error;

/// A failed call against the remote contact directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("rate limited by the contact directory")]
    RateLimited { retry_after: Option<Duration> },

    /// The entity already exists (e.g. a group name is taken).
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("contact directory returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl DirectoryError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// A sync run that could not start.
#[derive(Debug, Error)]
pub enum SyncError {
    /// One of the initial bulk fetches failed.
    #[error("failed to {operation}: {source}")]
    Prerequisite {
        operation: &'static str,
        #[source]
        source: DirectoryError,
    },
}
