//! Readable text extraction from HTML pages.

use scraper::{ElementRef, Html, Selector};

use super::{MAX_CONTENT_CHARS, MIN_PARAGRAPH_CHARS};

/// Elements whose contents never count as page text.
const EXCLUDED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "iframe", "aside"];

/// Extract the readable paragraph text of a page.
///
/// Paragraphs inside (or containing) excluded elements lose that content;
/// whitespace is collapsed; paragraphs of [`MIN_PARAGRAPH_CHARS`] characters
/// or fewer are dropped. The survivors are joined with a single space and cut
/// to [`MAX_CONTENT_CHARS`] characters. Returns `None` when nothing survives.
#[must_use]
pub fn extract_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let paragraphs = Selector::parse("p").ok()?;

    let kept: Vec<String> = document
        .select(&paragraphs)
        .filter(|p| !inside_excluded(*p))
        .map(|p| {
            let mut raw = String::new();
            collect_text(p, &mut raw);
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    if kept.is_empty() {
        return None;
    }

    Some(truncate_chars(&kept.join(" "), MAX_CONTENT_CHARS))
}

fn is_excluded(name: &str) -> bool {
    EXCLUDED_ELEMENTS.contains(&name)
}

fn inside_excluded(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_excluded(ancestor.value().name()))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !is_excluded(child.value().name()) {
                collect_text(child, out);
            }
        }
    }
}

/// Cut `s` to at most `max_chars` characters on a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
