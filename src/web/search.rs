//! Search providers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::error::NetworkError;
use super::MAX_SEARCH_RESULTS;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    /// Page URL the hit resolves to.
    pub identifier: String,
}

/// Something that turns a query into candidate pages.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for pages relevant to `query`.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, NetworkError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
}

/// Search backed by the `MediaWiki` `list=search` API.
#[derive(Debug, Clone)]
pub struct WikipediaSearch {
    client: Client,
    api_url: Url,
    page_base: Url,
    timeout: Duration,
}

impl WikipediaSearch {
    /// Create a search provider.
    ///
    /// # Errors
    ///
    /// Returns the offending URL if either URL cannot be parsed or the page
    /// base cannot hold path segments.
    pub fn new(
        client: Client,
        api_url: &str,
        page_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, InvalidUrl> {
        let api_url = Url::parse(api_url).map_err(|e| InvalidUrl::new(api_url, &e))?;
        let page_base =
            Url::parse(page_base_url).map_err(|e| InvalidUrl::new(page_base_url, &e))?;
        if page_base.cannot_be_a_base() {
            return Err(InvalidUrl {
                url: page_base_url.to_string(),
                reason: "cannot be a base URL".to_string(),
            });
        }

        Ok(Self {
            client,
            api_url,
            page_base,
            timeout,
        })
    }

    /// Resolve an article title to its page URL (`<base>/wiki/<Title_With_Underscores>`).
    #[must_use]
    pub fn page_url(&self, title: &str) -> String {
        let mut url = self.page_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("wiki")
                .push(&title.replace(' ', "_"));
        }
        url.to_string()
    }
}

#[async_trait]
impl SearchProvider for WikipediaSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, NetworkError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = self.api_url.as_str();
        let limit = MAX_SEARCH_RESULTS.to_string();
        let response = self
            .client
            .get(self.api_url.clone())
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(url, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| NetworkError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let hits = body
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .map(|entry| SearchHit {
                identifier: self.page_url(&entry.title),
                title: entry.title,
            })
            .collect();

        Ok(hits)
    }
}

/// A configured URL that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid URL `{url}`: {reason}")]
pub struct InvalidUrl {
    pub url: String,
    pub reason: String,
}

impl InvalidUrl {
    fn new(url: &str, err: &url::ParseError) -> Self {
        Self {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
