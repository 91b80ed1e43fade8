//! Error types for the fundraising API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The API token environment variable is unset or empty.
    #[error("API token not set: export {var}")]
    MissingToken { var: String },

    /// Non-success status other than rate limiting.
    #[error("fundraising API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The API asked us to slow down.
    #[error("fundraising API rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// A configured campaign id or name matched nothing.
    #[error("campaign '{selector}' not found among {available} campaigns")]
    CampaignNotFound { selector: String, available: usize },

    /// The account has no campaigns at all.
    #[error("no campaigns available")]
    NoCampaigns,
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CampaignNotFound { .. } | Self::NoCampaigns)
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
