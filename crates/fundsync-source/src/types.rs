//! API payload types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SourceError};

/// Identifier that may arrive as a JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Campaign {
    pub id: RecordId,
    #[serde(default, alias = "title")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub last_page: u64,
}

/// `{data: [...], meta: {current_page, last_page}}` envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T = Value> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl<T> Page<T> {
    /// Whether another page should be requested after this one.
    pub fn has_more(&self) -> bool {
        !self.data.is_empty()
            && self
                .meta
                .is_some_and(|meta| meta.current_page < meta.last_page)
    }
}

/// Which campaign a run works on; empty means the first one listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CampaignSelector {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Picks a campaign by id, then by case-insensitive name, else the first.
pub fn select_campaign(campaigns: Vec<Campaign>, selector: &CampaignSelector) -> Result<Campaign> {
    let available = campaigns.len();
    if let Some(id) = &selector.id {
        return campaigns
            .into_iter()
            .find(|c| c.id.to_string() == id.trim())
            .ok_or_else(|| SourceError::CampaignNotFound {
                selector: id.clone(),
                available,
            });
    }
    if let Some(name) = &selector.name {
        return campaigns
            .into_iter()
            .find(|c| c.name.trim().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| SourceError::CampaignNotFound {
                selector: name.clone(),
                available,
            });
    }
    campaigns.into_iter().next().ok_or(SourceError::NoCampaigns)
}
