//! Prompts for the generative backend.

use crate::knowledge::ContextItem;

/// System instruction sent with every question.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are an AI assistant. Provide helpful, accurate responses \
based on the context provided. Cite sources when available.";

/// Rendered in place of the context block when there is none.
pub const NO_CONTEXT: &str = "No additional context available.";

/// Render context items as numbered source blocks.
#[must_use]
pub fn render_context(context: &[ContextItem]) -> String {
    if context.is_empty() {
        return NO_CONTEXT.to_string();
    }

    context
        .iter()
        .enumerate()
        .map(|(i, item)| format!("Source {} ({}):\n{}\n", i + 1, item.source, item.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the user message for a question and its context.
#[must_use]
pub fn format_question(query: &str, context: &[ContextItem]) -> String {
    format!(
        "Question: {query}\n\nContext:\n{}",
        render_context(context)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_mentions_sources() {
        assert!(ASSISTANT_SYSTEM_PROMPT.contains("helpful, accurate"));
        assert!(ASSISTANT_SYSTEM_PROMPT.contains("Cite sources"));
    }

    #[test]
    fn test_render_empty_context() {
        assert_eq!(render_context(&[]), "No additional context available.");
    }

    #[test]
    fn test_render_numbers_sources() {
        let context = vec![
            ContextItem::new("local", "First fact."),
            ContextItem::new("https://en.wikipedia.org/wiki/Paris", "Second fact."),
        ];
        assert_eq!(
            render_context(&context),
            "Source 1 (local):\nFirst fact.\n\nSource 2 (https://en.wikipedia.org/wiki/Paris):\nSecond fact.\n"
        );
    }

    #[test]
    fn test_format_question() {
        let prompt = format_question("What is Rust?", &[]);
        assert_eq!(
            prompt,
            "Question: What is Rust?\n\nContext:\nNo additional context available."
        );
    }
}
