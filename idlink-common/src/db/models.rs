//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Link precedence of a contact within its cluster.
///
/// Exactly one non-deleted contact per cluster is `Primary` (the earliest
/// created); every other member is `Secondary` and carries a `linked_id`
/// pointing at the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Precedence {
    Primary,
    Secondary,
}

/// One stored contact record.
///
/// `created_at` is used only for ordering (oldest-wins tie-break, ties by
/// `id`). Tombstoned rows (`deleted_at` set) are excluded from every
/// reconciliation query but never physically removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linked_id: Option<i64>,
    pub precedence: Precedence,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Contact {
    /// Whether this record is the canonical anchor of its cluster.
    pub fn is_primary(&self) -> bool {
        self.precedence == Precedence::Primary
    }

    /// Ordering key for every chronological contract in the output:
    /// ascending creation time, ties broken by id for determinism.
    pub fn creation_key(&self) -> (NaiveDateTime, i64) {
        (self.created_at, self.id)
    }
}
