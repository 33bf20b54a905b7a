//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::knowledge::default_store_path;

/// Top-level assistant configuration, built once at startup and passed into
/// each component's constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub store: StoreConfig,
    pub web: WebConfig,
    pub generation: GenerationConfig,
}

/// Knowledge store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Web retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// `MediaWiki` search API endpoint.
    pub search_api_url: String,
    /// Base URL that article titles are resolved against.
    pub page_base_url: String,
    /// Timeout applied to every search and page request.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl WebConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            search_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            page_base_url: "https://en.wikipedia.org".to_string(),
            timeout_secs: 10,
            user_agent: concat!("robix/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Generative backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Whether to use a generative backend at all.
    pub enabled: bool,
    /// Ollama server URL.
    pub base_url: String,
    /// Model name passed to the backend.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Context window size in tokens.
    pub context_window: u32,
    /// Overall request timeout.
    pub timeout_secs: u64,
    /// Retries for 5xx responses inside the backend client.
    pub max_retries: u32,
    /// Connection probes at startup before declaring the backend absent.
    pub probe_attempts: u32,
    /// Delay between startup probes.
    pub probe_delay_secs: u64,
}

impl GenerationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn probe_delay(&self) -> Duration {
        Duration::from_secs(self.probe_delay_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.7,
            context_window: 4096,
            timeout_secs: 120,
            max_retries: 3,
            probe_attempts: 3,
            probe_delay_secs: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_config_defaults() {
        let config = WebConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.search_api_url, "https://en.wikipedia.org/w/api.php");
        assert!(config.user_agent.starts_with("robix/"));
    }

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert!(config.enabled);
        assert_eq!(config.model, "llama3");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.context_window, 4096);
        assert_eq!(config.probe_attempts, 3);
        assert_eq!(config.probe_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_store_config_default_path() {
        let config = StoreConfig::default();
        assert!(config.path.ends_with("knowledge.db"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml = r#"
            [store]
            path = "/tmp/robix.db"

            [generation]
            enabled = false
            model = "mistral"
        "#;
        let config: AssistantConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/robix.db"));
        assert!(!config.generation.enabled);
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.generation.context_window, 4096);
        assert_eq!(config.web.timeout_secs, 10);
    }
}
