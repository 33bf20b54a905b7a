//! Knowledge store implementation with async `SQLite` operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags};
use tokio::sync::Mutex;

use super::error::StoreError;
use super::schema::SCHEMA;
use super::types::{Category, ContextItem, KnowledgeRecord};

/// Maximum number of records a single lookup returns.
pub const MAX_QUERY_RESULTS: usize = 3;

/// How long a reader waits on a locked database before giving up.
const READ_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the default path for the knowledge database.
///
/// This is `~/.local/share/robix/knowledge.db` on Linux.
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("robix")
        .join("knowledge.db")
}

/// Persistent, append-only cache of knowledge fragments.
///
/// Writes go through a single mutex-guarded connection. File-backed stores
/// answer lookups from a fresh read-only connection so readers never wait on
/// an in-flight write; a reader may or may not see a record being written.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    writer: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl KnowledgeStore {
    /// Open a knowledge store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| StoreError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened knowledge store");

        Ok(Self {
            writer: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory knowledge store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, StoreError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        Ok(Self {
            writer: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Find up to [`MAX_QUERY_RESULTS`] records whose content contains `term`,
    /// newest first.
    ///
    /// Matching is a case-sensitive substring test; `%` and `_` are literal.
    /// An empty term matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn lookup(&self, term: &str) -> Result<Vec<KnowledgeRecord>, StoreError> {
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let term = term.to_string();

        if let Some(path) = self.path.clone() {
            return tokio::task::spawn_blocking(move || {
                let conn = Connection::open_with_flags(
                    &path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(|source| StoreError::DatabaseOpen { path, source })?;
                conn.busy_timeout(READ_BUSY_TIMEOUT)?;
                select_matching(&conn, &term)
            })
            .await
            .map_err(|_| StoreError::TaskCancelled)?;
        }

        let conn = self.writer.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            select_matching(&conn, &term)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Same as [`lookup`](Self::lookup), projected to generation context.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn query(&self, term: &str) -> Result<Vec<ContextItem>, StoreError> {
        let records = self.lookup(term).await?;
        Ok(records.into_iter().map(ContextItem::from).collect())
    }

    /// Append one record per item, tagged with `category`.
    ///
    /// Items with blank content are skipped. A failing insert does not stop
    /// the remaining ones; the successful inserts are committed and the
    /// failure count is reported as [`StoreError::PartialWrite`].
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails or any insert fails.
    pub async fn store(&self, items: &[ContextItem], category: Category) -> Result<(), StoreError> {
        let rows: Vec<(String, String)> = items
            .iter()
            .filter(|item| !item.content.trim().is_empty())
            .map(|item| (item.source.clone(), item.content.clone()))
            .collect();

        let skipped = items.len() - rows.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Skipping knowledge items with empty content");
        }
        if rows.is_empty() {
            return Ok(());
        }

        let conn = self.writer.clone();
        let (stored, failed) = tokio::task::spawn_blocking(
            move || -> Result<(usize, usize), StoreError> {
                let mut conn = conn.blocking_lock();
                let tx = conn.transaction()?;
                let mut stored = 0;
                let mut failed = 0;
                for (source, content) in &rows {
                    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                    match tx.execute(
                        "INSERT INTO knowledge_base (source_url, category, content, timestamp)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![source, category.as_str(), content, timestamp],
                    ) {
                        Ok(_) => stored += 1,
                        Err(e) => {
                            tracing::warn!(source = %source, error = %e, "Failed to insert knowledge record");
                            failed += 1;
                        }
                    }
                }
                tx.commit()?;
                Ok((stored, failed))
            },
        )
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(stored, failed, category = %category, "Stored knowledge records");

        if failed > 0 {
            return Err(StoreError::PartialWrite { stored, failed });
        }
        Ok(())
    }

    /// Count all records in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let conn = self.writer.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
            let conn = conn.blocking_lock();
            let count: u64 =
                conn.query_row("SELECT COUNT(*) FROM knowledge_base", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }
}

fn select_matching(conn: &Connection, term: &str) -> Result<Vec<KnowledgeRecord>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, source_url, category, content, timestamp
         FROM knowledge_base
         WHERE instr(content, ?1) > 0
         ORDER BY timestamp DESC, id DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(
            params![term, i64::try_from(MAX_QUERY_RESULTS).unwrap_or(i64::MAX)],
            |row| {
                let id: i64 = row.get(0)?;
                let source_url: String = row.get(1)?;
                let category: String = row.get(2)?;
                let content: String = row.get(3)?;
                let timestamp: String = row.get(4)?;
                Ok((id, source_url, category, content, timestamp))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let records = rows
        .into_iter()
        .map(|(id, source_url, category, content, timestamp)| {
            let category = category.parse().unwrap_or_else(|e| {
                tracing::warn!(id, error = %e, "Unrecognized category, treating as local");
                Category::Local
            });
            let created_at = DateTime::parse_from_rfc3339(&timestamp)
                .map_or_else(|_| DateTime::<Utc>::default(), |dt| dt.with_timezone(&Utc));
            KnowledgeRecord {
                id,
                source_url,
                category,
                content,
                created_at,
            }
        })
        .collect();

    Ok(records)
}
