//! Persistent knowledge cache.
//!
//! Stores knowledge fragments in `SQLite` and serves substring lookups of the
//! most recent matches. Records are append-only.

mod error;
mod schema;
mod store;
mod types;

pub use error::StoreError;
pub use schema::{SCHEMA, SCHEMA_VERSION};
pub use store::{default_store_path, KnowledgeStore, MAX_QUERY_RESULTS};
pub use types::{Category, ContextItem, KnowledgeRecord, UnknownCategory};
