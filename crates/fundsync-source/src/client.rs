//! Blocking client for the fundraising platform REST API.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SourceError};
use crate::types::{Campaign, Page};

pub const DEFAULT_BASE_URL: &str = "https://api.givebutter.com/v1/";

/// Environment variable holding the API token unless configured otherwise.
pub const DEFAULT_TOKEN_ENV: &str = "GIVEBUTTER_API_TOKEN";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stop after this many pages even if `meta` keeps promising more.
const MAX_PAGES: u64 = 10_000;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub struct FundraisingClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl FundraisingClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SourceError::MissingToken {
                var: DEFAULT_TOKEN_ENV.to_string(),
            });
        }
        let mut base_url =
            Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        // Relative joins drop the last path segment without a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Replaces the default 30 second request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(self)
    }

    /// Builds a client with the token read from `token_var`.
    pub fn from_env(base_url: &str, token_var: &str) -> Result<Self> {
        let token = std::env::var(token_var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SourceError::MissingToken {
                var: token_var.to_string(),
            })?;
        Self::new(base_url, token)
    }

    pub fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let values = self.get_all("campaigns")?;
        values
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|e| SourceError::Decode {
                    what: "campaign",
                    message: e.to_string(),
                })
            })
            .collect()
    }

    pub fn campaign_members(&self, campaign_id: &str) -> Result<Vec<Value>> {
        self.get_all(&format!("campaigns/{campaign_id}/members"))
    }

    pub fn tickets(&self) -> Result<Vec<Value>> {
        self.get_all("tickets")
    }

    fn get_all(&self, path: &str) -> Result<Vec<Value>> {
        let records = collect_pages(|page| self.get_page(path, page))?;
        info!(endpoint = path, records = records.len(), "fetched records");
        Ok(records)
    }

    fn get_page(&self, path: &str, page: u64) -> Result<Page> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        debug!(%url, "requesting page");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        decode(check_status(response)?, "page")
    }
}

/// Calls `fetch` with page numbers 1, 2, ... until the envelope says stop.
pub fn collect_pages<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u64) -> Result<Page<T>>,
{
    let mut records = Vec::new();
    let mut page = 1;
    loop {
        let current = fetch(page)?;
        let more = current.has_more();
        records.extend(current.data);
        if !more || page >= MAX_PAGES {
            break;
        }
        page += 1;
    }
    Ok(records)
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(SourceError::RateLimited { retry_after_secs });
    }
    let message = response
        .text()
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(SourceError::Upstream {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(response: Response, what: &'static str) -> Result<T> {
    let body = response
        .text()
        .map_err(|e| SourceError::Network(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| SourceError::Decode {
        what,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(ids: &[u64], current: u64, last: u64) -> Page {
        serde_json::from_value(json!({
            "data": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "meta": {"current_page": current, "last_page": last},
        }))
        .unwrap()
    }

    #[test]
    fn collects_every_page_in_order() {
        let mut requested = Vec::new();
        let records = collect_pages(|n| {
            requested.push(n);
            Ok(match n {
                1 => page(&[1, 2], 1, 3),
                2 => page(&[3], 2, 3),
                _ => page(&[4], 3, 3),
            })
        })
        .unwrap();

        assert_eq!(requested, vec![1, 2, 3]);
        let ids: Vec<u64> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_page_stops_early() {
        let mut calls = 0;
        let records = collect_pages(|_| {
            calls += 1;
            Ok(page(&[], 1, 5))
        })
        .unwrap();
        assert!(records.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn page_error_propagates() {
        let result = collect_pages::<Value, _>(|n| {
            if n == 2 {
                Err(SourceError::Upstream {
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok(page(&[1], 1, 2))
            }
        });
        assert!(matches!(result, Err(SourceError::Upstream { status: 500, .. })));
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(matches!(
            FundraisingClient::new(DEFAULT_BASE_URL, "  "),
            Err(SourceError::MissingToken { .. })
        ));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = FundraisingClient::new("https://api.example.org/v1", "token").unwrap();
        let joined = client.base_url.join("tickets").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.org/v1/tickets");
    }
}
