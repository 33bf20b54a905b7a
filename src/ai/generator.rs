//! Answer generation with a deterministic fallback.

use std::sync::Arc;

use crate::knowledge::ContextItem;

use super::client::{ChatBackend, ChatOptions};
use super::prompts::{format_question, ASSISTANT_SYSTEM_PROMPT};

/// Characters of each context item shown in a fallback answer.
const FALLBACK_EXCERPT_CHARS: usize = 200;

/// Turns a query and its context into answer text.
///
/// Whether a backend exists is decided once, at construction. A configured
/// backend that errors falls through to the same template used when there is
/// no backend at all; nothing is retried here.
#[derive(Clone)]
pub struct ResponseGenerator {
    backend: Option<Arc<dyn ChatBackend>>,
    options: ChatOptions,
}

impl std::fmt::Debug for ResponseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseGenerator")
            .field("has_backend", &self.has_backend())
            .field("options", &self.options)
            .finish()
    }
}

impl ResponseGenerator {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn ChatBackend>>, options: ChatOptions) -> Self {
        Self { backend, options }
    }

    /// A generator that always answers from the template.
    #[must_use]
    pub fn template_only() -> Self {
        Self::new(None, ChatOptions::default())
    }

    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Produce the answer for `query` given `context`.
    pub async fn generate(&self, query: &str, context: &[ContextItem]) -> String {
        let Some(backend) = &self.backend else {
            return fallback_response(query, context);
        };

        let user = format_question(query, context);
        match backend
            .chat(ASSISTANT_SYSTEM_PROMPT, &user, &self.options)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed, using fallback response");
                fallback_response(query, context)
            }
        }
    }
}

/// Build the templated answer used when no backend can answer.
#[must_use]
pub fn fallback_response(query: &str, context: &[ContextItem]) -> String {
    if context.is_empty() {
        return format!("I don't have information about '{query}'. Please try another question.");
    }

    let lines: Vec<String> = context
        .iter()
        .map(|item| format!("- {}...", excerpt(&item.content, FALLBACK_EXCERPT_CHARS)))
        .collect();
    format!(
        "I found this information about '{query}':\n{}",
        lines.join("\n")
    )
}

fn excerpt(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ai::GenerationError;

    struct RecordingBackend {
        reply: Result<String, String>,
        calls: Mutex<Vec<(String, String, ChatOptions)>>,
    }

    impl RecordingBackend {
        fn replying(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(String::from).map_err(String::from),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        async fn chat(
            &self,
            system: &str,
            user: &str,
            options: &ChatOptions,
        ) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string(), *options));
            self.reply.clone().map_err(GenerationError::RequestFailed)
        }
    }

    #[test]
    fn test_fallback_empty_context() {
        assert_eq!(
            fallback_response("capital of France", &[]),
            "I don't have information about 'capital of France'. Please try another question."
        );
    }

    #[test]
    fn test_fallback_lists_items_in_order() {
        let context = vec![
            ContextItem::new("local", "Paris is the capital of France."),
            ContextItem::new("web", "France is in Europe."),
        ];
        assert_eq!(
            fallback_response("Paris", &context),
            "I found this information about 'Paris':\n\
             - Paris is the capital of France....\n\
             - France is in Europe...."
        );
    }

    #[test]
    fn test_fallback_truncates_to_200_chars() {
        let long = "a".repeat(500);
        let response = fallback_response("q", &[ContextItem::new("s", long)]);
        let line = response.lines().nth(1).unwrap();
        assert_eq!(line, format!("- {}...", "a".repeat(200)));
    }

    #[test]
    fn test_excerpt_is_char_safe() {
        let text = "ü".repeat(300);
        assert_eq!(excerpt(&text, 200).chars().count(), 200);
        assert_eq!(excerpt("short", 200), "short");
    }

    #[tokio::test]
    async fn test_template_only_uses_fallback() {
        let generator = ResponseGenerator::template_only();
        assert!(!generator.has_backend());
        let context = vec![ContextItem::new("local", "Some fact about Rust.")];
        assert_eq!(
            generator.generate("Rust", &context).await,
            fallback_response("Rust", &context)
        );
    }

    #[tokio::test]
    async fn test_backend_reply_is_returned_verbatim() {
        let backend = RecordingBackend::replying(Ok("  Paris, per Source 1.\n"));
        let generator = ResponseGenerator::new(
            Some(backend.clone()),
            ChatOptions {
                temperature: 0.7,
                context_window: 4096,
            },
        );

        let context = vec![ContextItem::new("local", "Paris is the capital of France.")];
        let answer = generator.generate("capital of France?", &context).await;
        assert_eq!(answer, "  Paris, per Source 1.\n");

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (system, user, options) = &calls[0];
        assert_eq!(system, ASSISTANT_SYSTEM_PROMPT);
        assert!(user.starts_with("Question: capital of France?"));
        assert!(user.contains("Source 1 (local):\nParis is the capital of France."));
        assert_eq!(options.context_window, 4096);
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back_without_retry() {
        let backend = RecordingBackend::replying(Err("connection refused"));
        let generator = ResponseGenerator::new(Some(backend.clone()), ChatOptions::default());

        let answer = generator.generate("capital of France", &[]).await;
        assert_eq!(answer, fallback_response("capital of France", &[]));
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }
}
