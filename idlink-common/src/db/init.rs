//! Database initialization
//!
//! Creates the SQLite pool and the contacts schema on first run. Schema
//! creation is idempotent and safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed.
///
/// Connection options are applied per-connection by the pool: WAL journal
/// mode for concurrent readers, foreign keys on, and a busy timeout so
/// writers contending for the database lock wait instead of failing
/// immediately (the reconciliation path serializes writers with
/// `BEGIN IMMEDIATE`, see [`crate::db::tx::WriteTx`]).
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_contacts_table(&pool).await?;

    Ok(pool)
}

/// Create the contacts table
///
/// The sole entity of the reconciliation core. `id` is monotonically
/// assigned and creation-order comparable; at least one of `email`/`phone`
/// is always present; `linked_id` points from a secondary to its primary
/// and is NULL for primaries.
pub async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT,
            phone TEXT,
            linked_id INTEGER REFERENCES contacts(id),
            precedence TEXT NOT NULL CHECK (precedence IN ('primary', 'secondary')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP,
            CHECK (email IS NOT NULL OR phone IS NOT NULL),
            CHECK (precedence != 'secondary' OR linked_id IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Identifier lookups and cluster expansion both hit these
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_phone ON contacts(phone)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_linked_id ON contacts(linked_id)")
        .execute(pool)
        .await?;

    Ok(())
}
