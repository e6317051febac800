//! News item types stored in the cache table.

use serde::{Deserialize, Serialize};

/// Identifier of a news item. Sources report either strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewsId {
    Text(String),
    Number(i64),
}

impl From<&str> for NewsId {
    fn from(value: &str) -> Self {
        NewsId::Text(value.to_string())
    }
}

impl From<i64> for NewsId {
    fn from(value: i64) -> Self {
        NewsId::Number(value)
    }
}

impl std::fmt::Display for NewsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NewsId::Text(s) => write!(f, "{}", s),
            NewsId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Publication date as reported by the source: a formatted string or epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PubDate {
    Millis(i64),
    Text(String),
}

/// A single news entry scraped from a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: NewsId,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<PubDate>,
    /// Source-specific extras (hover text, icons, info labels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl NewsItem {
    pub fn new(id: impl Into<NewsId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            mobile_url: None,
            pub_date: None,
            extra: None,
        }
    }
}
