//! Gated, bounded web retrieval.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigurationError, WebConfig};
use crate::knowledge::ContextItem;

use super::error::NetworkError;
use super::extract::extract_content;
use super::fetch::{build_http_client, HttpFetcher, PageFetcher};
use super::search::{SearchProvider, WikipediaSearch};
use super::MAX_SEARCH_RESULTS;

/// Retrieves external content to fill knowledge gaps.
///
/// Every network call is bounded by a fixed timeout, independent of what the
/// underlying provider enforces. Failures are logged and turned into empty
/// results; nothing here returns an error to the caller.
#[derive(Clone)]
pub struct WebRetriever {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    timeout: Duration,
}

impl std::fmt::Debug for WebRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRetriever")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl WebRetriever {
    #[must_use]
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        timeout: Duration,
    ) -> Self {
        Self {
            search,
            fetcher,
            timeout,
        }
    }

    /// Build a Wikipedia-backed retriever from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a configured
    /// URL is invalid.
    pub fn from_config(config: &WebConfig) -> Result<Self, ConfigurationError> {
        let timeout = config.timeout();
        let client = build_http_client(timeout, &config.user_agent)?;
        let search = WikipediaSearch::new(
            client.clone(),
            &config.search_api_url,
            &config.page_base_url,
            timeout,
        )?;
        let fetcher = HttpFetcher::new(client, timeout);

        Ok(Self::new(Arc::new(search), Arc::new(fetcher), timeout))
    }

    /// Search for up to [`MAX_SEARCH_RESULTS`] candidate page URLs.
    ///
    /// Any failure yields an empty list.
    pub async fn search(&self, query: &str) -> Vec<String> {
        match self.bounded(query, self.search.search(query)).await {
            Ok(hits) => {
                let urls: Vec<String> = hits
                    .into_iter()
                    .take(MAX_SEARCH_RESULTS)
                    .map(|hit| hit.identifier)
                    .collect();
                tracing::debug!(query = %query, candidates = urls.len(), "Web search finished");
                urls
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Web search failed");
                Vec::new()
            }
        }
    }

    /// Download `url` and extract its readable text.
    ///
    /// Returns `None` if the fetch fails or the page has no usable content.
    pub async fn fetch_content(&self, url: &str) -> Option<String> {
        let html = match self.bounded(url, self.fetcher.fetch(url)).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Page fetch failed");
                return None;
            }
        };

        let content = extract_content(&html);
        if content.is_none() {
            tracing::debug!(url = %url, "Page has no usable content");
        }
        content
    }

    /// Search, then fetch each candidate, keeping pages that yield content.
    pub async fn retrieve(&self, query: &str) -> Vec<ContextItem> {
        let mut items = Vec::new();
        for url in self.search(query).await {
            if let Some(content) = self.fetch_content(&url).await {
                items.push(ContextItem::new(url, content));
            }
        }
        tracing::info!(query = %query, pages = items.len(), "Web retrieval finished");
        items
    }

    /// The fixed per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        target: &str,
        call: impl Future<Output = Result<T, NetworkError>>,
    ) -> Result<T, NetworkError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| NetworkError::Timeout {
                url: target.to_string(),
                timeout: self.timeout,
            })?
    }
}
