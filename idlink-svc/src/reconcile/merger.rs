//! Cluster merger
//!
//! A cluster view holds more than one primary when an observation bridges
//! previously unrelated clusters. The merge is two-phase: the full re-link
//! set is computed read-only from the view, then applied as row updates, so
//! no record is visited twice or missed due to interleaved mutation. The
//! survivor is the earliest-created primary (ties by id); its id never
//! changes across a merge.

use idlink_common::{Contact, Error, Precedence, Result};
use sqlx::SqliteConnection;
use tracing::info;

use crate::db::contacts;

/// One planned re-link: point `contact_id` at `new_linked_id` as a
/// secondary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relink {
    pub contact_id: i64,
    pub new_linked_id: i64,
}

/// The computed outcome of a merge decision, before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub survivor_id: i64,
    pub relinks: Vec<Relink>,
}

impl MergePlan {
    pub fn is_noop(&self) -> bool {
        self.relinks.is_empty()
    }
}

/// Deterministically select the surviving primary and compute the re-link
/// set (pure; phase one of the merge).
///
/// Every demoted primary is re-pointed at the survivor and demoted; every
/// contact linked to a demoted primary is re-pointed at the survivor as
/// well, so no link chain deeper than one survives. The same
/// survivor-then-cascade rule covers views with three or more primaries in
/// a single pass.
pub fn plan_merge(members: &[Contact]) -> Result<MergePlan> {
    let mut primaries: Vec<&Contact> = members.iter().filter(|c| c.is_primary()).collect();
    primaries.sort_by_key(|c| c.creation_key());

    let survivor = primaries.first().ok_or_else(|| {
        Error::Consistency("cluster view contains no primary contact".to_string())
    })?;
    let survivor_id = survivor.id;

    let mut relinks = Vec::new();
    for demoted in primaries.iter().skip(1) {
        relinks.push(Relink {
            contact_id: demoted.id,
            new_linked_id: survivor_id,
        });
        // Former secondaries of the demoted primary follow it to the
        // survivor, keeping their secondary precedence
        for member in members {
            if member.linked_id == Some(demoted.id) {
                relinks.push(Relink {
                    contact_id: member.id,
                    new_linked_id: survivor_id,
                });
            }
        }
    }

    Ok(MergePlan {
        survivor_id,
        relinks,
    })
}

/// Apply a merge plan and return a consistent post-merge view (phase two).
///
/// The row updates are not reflected in the in-memory view, so after a
/// non-trivial merge the full membership is re-fetched by
/// `id = survivor OR linked_id = survivor`.
pub async fn apply(
    conn: &mut SqliteConnection,
    members: Vec<Contact>,
    plan: &MergePlan,
) -> Result<Vec<Contact>> {
    if plan.is_noop() {
        return Ok(members);
    }

    for relink in &plan.relinks {
        contacts::update_link(conn, relink.contact_id, plan.survivor_id, Precedence::Secondary)
            .await?;
    }

    info!(
        "merged {} contact(s) into surviving primary {}",
        plan.relinks.len(),
        plan.survivor_id
    );

    let mut refreshed = contacts::find_by_ids(conn, &[plan.survivor_id]).await?;
    refreshed.extend(contacts::find_by_linked_ids(conn, &[plan.survivor_id]).await?);
    refreshed.sort_by_key(Contact::creation_key);
    refreshed.dedup_by_key(|c| c.id);

    Ok(refreshed)
}
