//! Page fetchers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::error::NetworkError;

/// Something that downloads a page's raw HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the raw body of `url`.
    async fn fetch(&self, url: &str) -> Result<String, NetworkError>;
}

/// Fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        let response = self
            .client
            .get(url)
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

        response
            .text()
            .await
            .map_err(|e| NetworkError::from_reqwest(url, &e, self.timeout))
    }
}

/// Build the HTTP client shared by search and fetch, with the fixed timeout.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}
