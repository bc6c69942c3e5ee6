//! Shared test helpers: temp-file databases, seeded contacts, and cluster
//! invariant assertions.

// Not every integration test uses every helper
#![allow(dead_code)]

use idlink_common::{Contact, Precedence};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a file-backed test database with the full schema.
///
/// File-backed rather than in-memory so that every pool connection sees the
/// same database, which the concurrency tests depend on. The TempDir must
/// stay alive for the duration of the test.
pub async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = idlink_common::db::init_database(&dir.path().join("idlink-test.db"))
        .await
        .expect("Failed to initialize test database");
    (pool, dir)
}

/// Insert a contact row directly, with an explicit creation timestamp so
/// tests can control merge ordering.
pub async fn seed_contact(
    pool: &SqlitePool,
    email: Option<&str>,
    phone: Option<&str>,
    linked_id: Option<i64>,
    precedence: &str,
    created_at: &str,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO contacts (email, phone, linked_id, precedence, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(email)
    .bind(phone)
    .bind(linked_id)
    .bind(precedence)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .expect("Failed to seed contact")
}

/// Mark a contact as tombstoned.
pub async fn tombstone_contact(pool: &SqlitePool, id: i64) {
    sqlx::query("UPDATE contacts SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .expect("Failed to tombstone contact");
}

/// All non-deleted contacts, ordered by (created_at, id).
pub async fn all_contacts(pool: &SqlitePool) -> Vec<Contact> {
    sqlx::query_as::<_, Contact>(
        "SELECT id, email, phone, linked_id, precedence, created_at, deleted_at \
         FROM contacts WHERE deleted_at IS NULL ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await
    .expect("Failed to fetch contacts")
}

pub async fn contact_count(pool: &SqlitePool) -> usize {
    all_contacts(pool).await.len()
}

/// Assert the stored-data invariants that must hold after every request:
/// every secondary links to an existing primary (never to another
/// secondary), and within each cluster exactly one member is primary and it
/// is the earliest-created one.
pub async fn assert_invariants(pool: &SqlitePool) {
    let contacts = all_contacts(pool).await;

    for contact in &contacts {
        assert!(
            contact.email.is_some() || contact.phone.is_some(),
            "contact {} has neither email nor phone",
            contact.id
        );

        match contact.precedence {
            Precedence::Primary => {
                assert!(
                    contact.linked_id.is_none(),
                    "primary {} carries a linked id",
                    contact.id
                );
            }
            Precedence::Secondary => {
                let linked_id = contact
                    .linked_id
                    .unwrap_or_else(|| panic!("secondary {} has no linked id", contact.id));
                let target = contacts
                    .iter()
                    .find(|c| c.id == linked_id)
                    .unwrap_or_else(|| {
                        panic!("secondary {} links to missing contact {}", contact.id, linked_id)
                    });
                assert_eq!(
                    target.precedence,
                    Precedence::Primary,
                    "secondary {} links to secondary {}",
                    contact.id,
                    linked_id
                );
            }
        }
    }

    // Each cluster keys by its primary's id; the primary must be the
    // earliest-created member of its cluster
    for primary in contacts.iter().filter(|c| c.is_primary()) {
        let cluster: Vec<&Contact> = contacts
            .iter()
            .filter(|c| c.id == primary.id || c.linked_id == Some(primary.id))
            .collect();
        let earliest = cluster
            .iter()
            .min_by_key(|c| c.creation_key())
            .expect("cluster cannot be empty");
        assert_eq!(
            earliest.id, primary.id,
            "primary {} is not the earliest-created member of its cluster",
            primary.id
        );
        let primaries_in_cluster = cluster.iter().filter(|c| c.is_primary()).count();
        assert_eq!(
            primaries_in_cluster, 1,
            "cluster of primary {} has {} primaries",
            primary.id, primaries_in_cluster
        );
    }
}
