//! Colored CLI display utilities for assistant output.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::knowledge::ContextItem;
use crate::pipeline::QueryResult;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_chars: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

/// Format one context item as a single source line.
#[must_use]
pub fn format_source(index: usize, item: &ContextItem, raw_mode: bool) -> String {
    format!(
        "{}. {} {}",
        index + 1,
        item.source,
        truncate(&item.content, 80, raw_mode)
    )
}

/// Print the answer, followed by the sources it used.
pub fn print_answer(result: &QueryResult, raw_mode: bool) {
    println!("\n{} {}", "[Assistant]:".green().bold(), result.response_text);
    if !result.context_used.is_empty() {
        println!("\n{}", "Sources:".dimmed());
        for (i, item) in result.context_used.iter().enumerate() {
            println!("  {}", format_source(i, item, raw_mode).dimmed());
        }
    }
    let _ = io::stdout().flush();
}

/// Print confirmation of a learned fact.
pub fn print_learned(source: &str) {
    println!(
        "{} {} stored from {}",
        timestamp().dimmed(),
        "[LEARN]".blue().bold(),
        source.cyan()
    );
    let _ = io::stdout().flush();
}

/// Print knowledge store location and size.
pub fn print_store_status(path: Option<&Path>, records: u64) {
    let location = path.map_or_else(|| "in-memory".to_string(), |p| p.display().to_string());
    println!(
        "{} {} {} ({} records)",
        timestamp().dimmed(),
        "[STORE]".blue().bold(),
        location.cyan(),
        records
    );
    let _ = io::stdout().flush();
}

/// Print generative backend connection test result.
pub fn print_connection_test(backend: &str, model: &str, success: bool) {
    let ts = timestamp();
    if success {
        println!(
            "{} {} {} ({}) - {}",
            ts.dimmed(),
            "[AI]".magenta().bold(),
            backend.cyan(),
            model.dimmed(),
            "connected".green()
        );
    } else {
        println!(
            "{} {} {} ({}) - {}",
            ts.dimmed(),
            "[AI]".magenta().bold(),
            backend.cyan(),
            model.dimmed(),
            "unavailable, using templated answers".yellow()
        );
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10, false), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("hello", 5, false), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8, false), "hello...");
    }

    #[test]
    fn test_truncate_very_short_max() {
        assert_eq!(truncate("hello", 3, false), "...");
        assert_eq!(truncate("hello", 0, false), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("héllo wörld", 8, false), "héllo...");
    }

    #[test]
    fn test_truncate_raw_mode_no_truncation() {
        let long_string = "a".repeat(200);
        assert_eq!(truncate(&long_string, 10, true), long_string);
    }

    #[test]
    fn test_format_source() {
        let item = ContextItem::new("https://en.wikipedia.org/wiki/Paris", "a".repeat(100));
        let line = format_source(0, &item, false);
        assert!(line.starts_with("1. https://en.wikipedia.org/wiki/Paris "));
        assert!(line.ends_with("..."));
    }
}
