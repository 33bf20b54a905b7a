//! Opt-in web retrieval.
//!
//! Searches for candidate pages and extracts their readable paragraph text.
//! The caller decides whether retrieval runs at all; nothing here prompts.

mod error;
mod extract;
mod fetch;
mod retriever;
mod search;

pub use error::NetworkError;
pub use extract::extract_content;
pub use fetch::{build_http_client, HttpFetcher, PageFetcher};
pub use retriever::WebRetriever;
pub use search::{InvalidUrl, SearchHit, SearchProvider, WikipediaSearch};

/// Maximum number of candidate pages taken from one search.
pub const MAX_SEARCH_RESULTS: usize = 3;

/// Paragraphs this short or shorter are discarded.
pub const MIN_PARAGRAPH_CHARS: usize = 50;

/// Upper bound on extracted page content, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;
