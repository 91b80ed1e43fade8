//! Fundraising platform API client.
//!
//! A blocking client for the campaign, member and ticket endpoints. List
//! endpoints are paginated with `?page=N` and a `{data, meta}` envelope;
//! pages are fetched sequentially until `current_page >= last_page`.

mod client;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TOKEN_ENV, FundraisingClient, collect_pages};
pub use error::{Result, SourceError};
pub use types::{Campaign, CampaignSelector, Page, PageMeta, RecordId, select_campaign};
