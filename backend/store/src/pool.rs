//! Bounded pool of SQLite connections.
//!
//! Every connection is opened up front. `get()` waits for a semaphore permit
//! and hands out a guard that puts the connection back when dropped, so a
//! connection is released on every exit path of the operation that used it.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info};

use scribe_core::{ScribeError, ScribeResult};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    permits: Semaphore,
    size: usize,
}

impl ConnectionPool {
    /// Open `size` connections to the database file at `path`.
    ///
    /// `init` runs once on the first connection before the rest are opened
    /// (schema creation goes here).
    pub fn open(
        path: impl AsRef<Path>,
        size: usize,
        init: impl FnOnce(&Connection) -> Result<()>,
    ) -> Result<Self> {
        if size == 0 {
            bail!("connection pool size must be at least 1");
        }
        let path = path.as_ref();

        let mut conns = Vec::with_capacity(size);
        for i in 0..size {
            let conn = Connection::open(path)
                .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            if i == 0 {
                conn.execute_batch("PRAGMA journal_mode=WAL;")
                    .context("Failed to enable WAL journal")?;
            }
            conns.push(conn);
        }
        init(&conns[0])?;

        info!(path = %path.display(), size, "SQLite connection pool opened");
        Ok(Self::from_connections(conns))
    }

    /// Single-connection pool over a private in-memory database.
    ///
    /// Each in-memory connection is its own database, so the pool can never
    /// hold more than one.
    pub fn in_memory(init: impl FnOnce(&Connection) -> Result<()>) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        init(&conn)?;
        Ok(Self::from_connections(vec![conn]))
    }

    fn from_connections(conns: Vec<Connection>) -> Self {
        let size = conns.len();
        Self {
            idle: Mutex::new(conns),
            permits: Semaphore::new(size),
            size,
        }
    }

    /// Wait for a free connection.
    pub async fn get(&self) -> ScribeResult<PooledConnection<'_>> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScribeError::Storage("connection pool closed".into()))?;
        let conn = self
            .lock_idle()
            .pop()
            .ok_or_else(|| ScribeError::Storage("connection pool exhausted".into()))?;
        debug!(available = self.permits.available_permits(), "Acquired pooled connection");
        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
            _permit: permit,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Connections not currently checked out.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A checked-out connection. Returned to the pool on drop.
pub struct PooledConnection<'a> {
    conn: Option<Connection>,
    pool: &'a ConnectionPool,
    // Dropped after `Drop::drop` has put the connection back.
    _permit: SemaphorePermit<'a>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("pooled connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.lock_idle().push(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_init(_: &Connection) -> Result<()> {
        Ok(())
    }

    #[tokio::test]
    async fn test_connection_returned_on_drop() {
        let pool = ConnectionPool::in_memory(no_init).unwrap();
        assert_eq!(pool.available(), 1);
        {
            let conn = pool.get().await.unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);

        // Same connection, same in-memory database.
        let conn = pool.get().await.unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_connection_returned_on_error_path() {
        let pool = ConnectionPool::in_memory(no_init).unwrap();
        let failing = async {
            let conn = pool.get().await?;
            conn.execute_batch("NOT VALID SQL").map_err(ScribeError::storage)?;
            Ok::<_, ScribeError>(())
        };
        assert!(failing.await.is_err());
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_file_pool_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(dir.path().join("pool.db"), 2, no_init).unwrap();
        assert_eq!(pool.size(), 2);

        let a = pool.get().await.unwrap();
        let _b = pool.get().await.unwrap();
        assert_eq!(pool.available(), 0);

        let third = tokio::time::timeout(Duration::from_millis(50), pool.get()).await;
        assert!(third.is_err(), "third checkout must wait for a release");

        drop(a);
        let c = tokio::time::timeout(Duration::from_millis(50), pool.get()).await;
        assert!(c.is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConnectionPool::open(dir.path().join("x.db"), 0, no_init).is_err());
    }
}
