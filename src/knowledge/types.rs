//! Knowledge record and context types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a knowledge record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Added by hand through the local `learn` path.
    Local,
    /// Extracted from a fetched web page.
    WebScrape,
}

impl Category {
    /// Returns the string stored in the `category` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::WebScrape => "web_scrape",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored category string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown knowledge category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "web_scrape" => Ok(Self::WebScrape),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// A persisted knowledge fragment. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub id: i64,
    pub source_url: String,
    pub category: Category,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeRecord {
    /// Project this record into generation input.
    #[must_use]
    pub fn to_context(&self) -> ContextItem {
        ContextItem {
            source: self.source_url.clone(),
            content: self.content.clone(),
        }
    }
}

impl From<KnowledgeRecord> for ContextItem {
    fn from(record: KnowledgeRecord) -> Self {
        Self {
            source: record.source_url,
            content: record.content,
        }
    }
}

/// A text fragment with its origin, used as input to response generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    pub source: String,
    pub content: String,
}

impl ContextItem {
    #[must_use]
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}
