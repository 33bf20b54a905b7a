//! Generative backend client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GenerationConfig;

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Determine if a request should be retried based on status code and attempt count.
fn should_retry(status_code: u16, attempt: u32, max_retries: u32) -> bool {
    if attempt >= max_retries {
        return false;
    }
    // Retry on 5xx server errors
    (500..600).contains(&status_code)
}

/// Calculate exponential backoff duration for retry attempts.
fn calculate_backoff(attempt: u32) -> Duration {
    // Exponential backoff: 1s, 2s, 4s
    Duration::from_secs(1 << attempt.min(6))
}

/// Errors from generative backend calls.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Backend request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse backend response: {0}")]
    ParseError(String),
    #[error("Backend request timed out")]
    Timeout,
}

/// Sampling options passed with every chat call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    /// Context window size in tokens.
    pub context_window: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            context_window: 4096,
        }
    }
}

impl From<&GenerationConfig> for ChatOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            context_window: config.context_window,
        }
    }
}

/// A text-completion backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate a reply to `user` under the `system` instruction.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: &ChatOptions,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 2],
    stream: bool,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama chat backend.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    #[must_use]
    pub fn new(client: Client, base_url: String, model: String, max_retries: u32) -> Self {
        Self {
            client,
            base_url,
            model,
            max_retries,
        }
    }

    /// Create a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout())
            .build()?;
        Ok(Self::new(
            client,
            config.base_url.clone(),
            config.model.clone(),
            config.max_retries,
        ))
    }

    /// Get the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Check that the server is reachable, trying up to `attempts` times.
    pub async fn probe(&self, attempts: u32, delay: Duration) -> bool {
        let url = self.endpoint("/api/tags");
        let attempts = attempts.max(1);

        for attempt in 1..=attempts {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(url = %url, attempt, "Generative backend reachable");
                    return true;
                }
                Ok(response) => {
                    tracing::debug!(url = %url, attempt, status = %response.status(), "Backend probe rejected");
                }
                Err(e) => {
                    tracing::debug!(url = %url, attempt, error = %e, "Backend probe failed");
                }
            }
            if attempt < attempts {
                tracing::info!(attempt, attempts, "Generative backend not ready, retrying");
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!(url = %url, attempts, "Generative backend unreachable");
        false
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: &ChatOptions,
    ) -> Result<String, GenerationError> {
        let url = self.endpoint("/api/chat");
        let body = ChatRequest {
            model: &self.model,
            messages: [
                RequestMessage {
                    role: "system",
                    content: system,
                },
                RequestMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: RequestOptions {
                temperature: options.temperature,
                num_ctx: options.context_window,
            },
        };

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        GenerationError::Timeout
                    } else {
                        GenerationError::RequestFailed(e.to_string())
                    }
                })?;

            let status = response.status();
            if status.is_success() {
                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| GenerationError::ParseError(e.to_string()))?;
                return Ok(parsed.message.content);
            }

            let status_code = status.as_u16();
            if should_retry(status_code, attempt, self.max_retries) {
                let backoff = calculate_backoff(attempt);
                tracing::debug!(status = status_code, attempt, ?backoff, "Retrying backend request");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed(format!("HTTP {status}: {text}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_logic() {
        // 5xx errors should be retried
        assert!(should_retry(500, 0, 3));
        assert!(should_retry(502, 1, 3));
        assert!(should_retry(503, 2, 3));

        // 4xx errors should NOT be retried
        assert!(!should_retry(400, 0, 3));
        assert!(!should_retry(404, 0, 3));
        assert!(!should_retry(429, 0, 3));

        // Success codes should NOT be retried
        assert!(!should_retry(200, 0, 3));

        // Max retries should stop retry
        assert!(!should_retry(500, 3, 3));
        assert!(!should_retry(500, 0, 0));
    }

    #[test]
    fn test_calculate_backoff() {
        assert_eq!(calculate_backoff(0).as_secs(), 1);
        assert_eq!(calculate_backoff(1).as_secs(), 2);
        assert_eq!(calculate_backoff(2).as_secs(), 4);
        assert_eq!(calculate_backoff(40).as_secs(), 64);
    }

    #[test]
    fn test_chat_options_from_config() {
        let config = GenerationConfig {
            temperature: 0.2,
            context_window: 8192,
            ..GenerationConfig::default()
        };
        let options = ChatOptions::from(&config);
        assert!((options.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(options.context_window, 8192);
        assert_eq!(ChatOptions::default().context_window, 4096);
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatRequest {
            model: "llama3",
            messages: [
                RequestMessage {
                    role: "system",
                    content: "sys",
                },
                RequestMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            stream: false,
            options: RequestOptions {
                temperature: 0.5,
                num_ctx: 4096,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["options"]["num_ctx"], 4096);
        assert_eq!(json["options"]["temperature"], 0.5);
    }

    #[test]
    fn test_parse_chat_response() {
        let json = r#"{"model":"llama3","created_at":"2024-01-01T00:00:00Z",
            "message":{"role":"assistant","content":"Paris."},"done":true}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.message.content, "Paris.");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = OllamaBackend::new(
            Client::new(),
            "http://localhost:11434/".to_string(),
            "llama3".to_string(),
            0,
        );
        assert_eq!(backend.endpoint("/api/chat"), "http://localhost:11434/api/chat");
        assert_eq!(backend.model(), "llama3");
    }

    #[test]
    fn test_from_config() {
        let backend = OllamaBackend::from_config(&GenerationConfig::default()).unwrap();
        assert_eq!(backend.model(), "llama3");
        assert_eq!(backend.max_retries, 3);
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let backend = OllamaBackend::new(
            Client::new(),
            "http://127.0.0.1:9".to_string(),
            "llama3".to_string(),
            0,
        );
        assert!(!backend.probe(2, Duration::from_millis(10)).await);
    }
}
