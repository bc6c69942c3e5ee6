//! Contact table queries
//!
//! The narrow store interface the reconciliation core depends on: lookup by
//! identifier, lookup by id / linked id, insert, and the merge re-link
//! update. Every function takes `&mut SqliteConnection` so calls compose
//! into the per-request write transaction.

use idlink_common::{Contact, Error, Precedence, Result};
use sqlx::SqliteConnection;

const CONTACT_COLUMNS: &str = "id, email, phone, linked_id, precedence, created_at, deleted_at";

/// Find non-deleted contacts matching either identifier (OR semantics).
///
/// A side whose value is absent is skipped; supplying neither is an input
/// error, rejected here as a last line of defense (the pipeline validates
/// before opening a transaction).
pub async fn find_by_identifier(
    conn: &mut SqliteConnection,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Vec<Contact>> {
    let contacts = match (email, phone) {
        (Some(email), Some(phone)) => {
            sqlx::query_as::<_, Contact>(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts \
                 WHERE deleted_at IS NULL AND (email = ? OR phone = ?)"
            ))
            .bind(email)
            .bind(phone)
            .fetch_all(&mut *conn)
            .await?
        }
        (Some(email), None) => {
            sqlx::query_as::<_, Contact>(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts \
                 WHERE deleted_at IS NULL AND email = ?"
            ))
            .bind(email)
            .fetch_all(&mut *conn)
            .await?
        }
        (None, Some(phone)) => {
            sqlx::query_as::<_, Contact>(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts \
                 WHERE deleted_at IS NULL AND phone = ?"
            ))
            .bind(phone)
            .fetch_all(&mut *conn)
            .await?
        }
        (None, None) => {
            return Err(Error::InvalidInput(
                "at least one of email or phone is required".to_string(),
            ))
        }
    };

    Ok(contacts)
}

/// Fetch non-deleted contacts by id.
pub async fn find_by_ids(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<Contact>> {
    fetch_by_id_column(conn, "id", ids).await
}

/// Fetch non-deleted contacts whose `linked_id` is in the given set.
pub async fn find_by_linked_ids(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<Contact>> {
    fetch_by_id_column(conn, "linked_id", ids).await
}

async fn fetch_by_id_column(
    conn: &mut SqliteConnection,
    column: &str,
    ids: &[i64],
) -> Result<Vec<Contact>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // SQLite has no array binds; expand one placeholder per id
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts \
         WHERE deleted_at IS NULL AND {column} IN ({placeholders})"
    );

    let mut query = sqlx::query_as::<_, Contact>(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    Ok(query.fetch_all(&mut *conn).await?)
}

/// Insert a new contact; the store assigns `id` and `created_at`.
pub async fn insert(
    conn: &mut SqliteConnection,
    email: Option<&str>,
    phone: Option<&str>,
    linked_id: Option<i64>,
    precedence: Precedence,
) -> Result<Contact> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "INSERT INTO contacts (email, phone, linked_id, precedence) \
         VALUES (?, ?, ?, ?) \
         RETURNING {CONTACT_COLUMNS}"
    ))
    .bind(email)
    .bind(phone)
    .bind(linked_id)
    .bind(precedence)
    .fetch_one(&mut *conn)
    .await?;

    Ok(contact)
}

/// Re-point one contact at a new primary, optionally demoting it.
///
/// The only mutation the reconciliation core performs on existing rows;
/// used exclusively by the merge stage.
pub async fn update_link(
    conn: &mut SqliteConnection,
    id: i64,
    linked_id: i64,
    precedence: Precedence,
) -> Result<()> {
    sqlx::query(
        "UPDATE contacts \
         SET linked_id = ?, precedence = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?",
    )
    .bind(linked_id)
    .bind(precedence)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
