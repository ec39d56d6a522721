//! SQLite-backed durable message store.
//!
//! Rows live in a single `messages` table. `INTEGER PRIMARY KEY AUTOINCREMENT`
//! gives ids that only ever grow, even after truncation or pruning removed the
//! newest rows. Each operation checks out one pooled connection for exactly one
//! statement.
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Params};
use tracing::debug;

use scribe_core::{Message, Role, ScribeError, ScribeResult};

use crate::pool::ConnectionPool;
use crate::store::{MessageStore, NewMessage};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id  TEXT NOT NULL,
        role        TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'summary')),
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);";

const COLUMNS: &str = "id, session_id, role, content, created_at";

pub struct SqliteMessageStore {
    pool: ConnectionPool,
}

impl SqliteMessageStore {
    /// Create or open a database at the given path with `pool_size` connections.
    /// The path `:memory:` opens a private in-memory database instead.
    pub fn open(path: impl AsRef<Path>, pool_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return Self::in_memory();
        }
        let pool = ConnectionPool::open(path, pool_size, init_schema)?;
        Ok(Self { pool })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory(init_schema)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    async fn delete(&self, sql: &str, session_id: &str, id: i64) -> ScribeResult<u64> {
        let conn = self.pool.get().await?;
        let removed = conn
            .execute(sql, params![session_id, id])
            .map_err(ScribeError::storage)?;
        Ok(removed as u64)
    }
}

fn query_messages(conn: &Connection, sql: &str, args: impl Params) -> ScribeResult<Vec<Message>> {
    let mut stmt = conn.prepare_cached(sql).map_err(ScribeError::storage)?;
    let rows = stmt
        .query_map(args, row_to_message)
        .map_err(ScribeError::storage)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(ScribeError::storage)?;
    Ok(rows)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to initialize messages schema")
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn insert(&self, row: NewMessage<'_>) -> ScribeResult<i64> {
        let (session_id, role) = (row.session_id(), row.role());
        let conn = self.pool.get().await?;
        let id: i64 = conn
            .query_row(
                "INSERT INTO messages (session_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![session_id, role.as_str(), row.content(), Utc::now().to_rfc3339()],
                |r| r.get(0),
            )
            .map_err(ScribeError::storage)?;
        debug!(session_id = %session_id, id, role = %role, "Inserted message");
        Ok(id)
    }

    async fn list_conversation(&self, session_id: &str) -> ScribeResult<Vec<Message>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE session_id = ?1 AND role IN ('user', 'assistant')
             ORDER BY id ASC"
        );
        query_messages(&conn, &sql, params![session_id])
    }

    async fn recent_window(&self, session_id: &str, limit: usize) -> ScribeResult<Vec<Message>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE session_id = ?1 AND role IN ('user', 'assistant')
             ORDER BY id DESC LIMIT ?2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.pool.get().await?;
        let mut window = query_messages(&conn, &sql, params![session_id, limit])?;
        window.reverse();
        Ok(window)
    }

    async fn truncate_from(&self, session_id: &str, from_id: i64) -> ScribeResult<u64> {
        self.delete(
            "DELETE FROM messages WHERE session_id = ?1 AND id >= ?2",
            session_id,
            from_id,
        )
        .await
    }

    async fn prune_up_to(&self, session_id: &str, up_to_id: i64) -> ScribeResult<u64> {
        self.delete(
            "DELETE FROM messages
             WHERE session_id = ?1 AND id <= ?2 AND role IN ('user', 'assistant')",
            session_id,
            up_to_id,
        )
        .await
    }

    async fn list_all(&self, session_id: &str) -> ScribeResult<Vec<Message>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE session_id = ?1
             ORDER BY id ASC"
        );
        let conn = self.pool.get().await?;
        query_messages(&conn, &sql, params![session_id])
    }

    async fn latest_summary(&self, session_id: &str) -> ScribeResult<Option<Message>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE session_id = ?1 AND role = 'summary'
             ORDER BY id DESC LIMIT 1"
        );
        conn.query_row(&sql, params![session_id], row_to_message)
            .optional()
            .map_err(ScribeError::storage)
    }
}

// ---------------------------------------------------------------------------
// Row deserialization helper
// ---------------------------------------------------------------------------

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let created_at: String = row.get(4)?;

    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role,
        content: row.get(3)?,
        created_at,
    })
}
