//! Web retrieval error types.

use std::time::Duration;

/// Errors from search and page fetch requests.
#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request to {url} timed out after {}s", .timeout.as_secs())]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },
}

impl NetworkError {
    /// Classify a `reqwest` error for the given URL.
    pub(crate) fn from_reqwest(url: &str, err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if err.is_decode() {
            Self::Parse {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Returns true if the request was cut off by the timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
