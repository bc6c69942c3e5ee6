//! Write-transaction guard
//!
//! The reconciliation pipeline must run its whole locate -> merge -> record
//! sequence as one serializable unit of work. SQLite's default deferred
//! transaction only takes the write lock at the first write, which would let
//! two concurrent observations both pass the duplicate check before either
//! commits. `WriteTx` issues `BEGIN IMMEDIATE` so the write lock is held for
//! the whole sequence; a contending request waits on the connection's busy
//! timeout and then re-reads committed state.

use crate::{Error, Result};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

/// An exclusive write transaction on one pooled SQLite connection.
///
/// Must be finished with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). If the guard is dropped instead (request
/// aborted mid-flight), the connection is detached from the pool and closed;
/// SQLite aborts the open transaction on close, so no partial write is ever
/// observable and no dirty connection returns to the pool.
pub struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTx {
    /// Acquire a connection and take the database write lock.
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self { conn: Some(conn) })
    }

    /// The connection to run the transaction's statements on.
    pub fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| Error::Internal("transaction already finished".to_string()))
    }

    /// Commit and return the connection to the pool.
    pub async fn commit(mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = sqlx::query("COMMIT").execute(&mut *conn).await {
                // Do not return a connection to the pool mid-transaction
                drop(conn.detach());
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Roll back and return the connection to the pool.
    pub async fn rollback(mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                drop(conn.detach());
                return Err(e.into());
            }
        }
        Ok(())
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Detaching closes the connection instead of returning it to the
            // pool; SQLite rolls the open transaction back on close.
            drop(conn.detach());
        }
    }
}
