//! Cluster locator
//!
//! Finds every stored contact touching an observation's identifiers and
//! expands to the full connected cluster membership. The expansion is
//! two-hop: an observation may match only a secondary (whose primary must
//! be pulled in through `linked_id`), or only a primary whose other
//! secondaries do not match the observation at all; both must land in one
//! consistent view before any merge decision is made.

use std::collections::{BTreeMap, BTreeSet};

use idlink_common::{Contact, Error, Result};
use sqlx::SqliteConnection;
use tracing::debug;

use super::{ClusterView, Observation};
use crate::db::contacts;

/// Locate the cluster(s) touching the observation.
pub async fn locate(
    conn: &mut SqliteConnection,
    observation: &Observation,
) -> Result<ClusterView> {
    observation.validate()?;

    let seeds = contacts::find_by_identifier(
        conn,
        observation.email.as_deref(),
        observation.phone.as_deref(),
    )
    .await?;

    if seeds.is_empty() {
        return Ok(ClusterView::None);
    }

    // Cluster-defining ids: every seed's own id, plus the primary any
    // matched secondary points at.
    let mut cluster_ids: BTreeSet<i64> = BTreeSet::new();
    for contact in &seeds {
        cluster_ids.insert(contact.id);
        if let Some(linked) = contact.linked_id {
            cluster_ids.insert(linked);
        }
    }
    let cluster_ids: Vec<i64> = cluster_ids.into_iter().collect();

    // Second hop: the ids themselves plus every secondary pointing at one
    // of them, unioned with the seeds and deduplicated by id.
    let mut members: BTreeMap<i64, Contact> = BTreeMap::new();
    for contact in seeds {
        members.insert(contact.id, contact);
    }
    for contact in contacts::find_by_ids(conn, &cluster_ids).await? {
        members.entry(contact.id).or_insert(contact);
    }
    for contact in contacts::find_by_linked_ids(conn, &cluster_ids).await? {
        members.entry(contact.id).or_insert(contact);
    }

    let mut members: Vec<Contact> = members.into_values().collect();
    members.sort_by_key(Contact::creation_key);

    debug!("located cluster view of {} contact(s)", members.len());

    verify_cluster(&members)?;
    Ok(ClusterView::Found(members))
}

/// Reject views that show prior corruption.
///
/// A view spanning two clusters legitimately holds more than one primary
/// until the merger runs; what can never appear is a secondary without a
/// link, a link chain deeper than one, a link out of the assembled view
/// (its target could only be a tombstoned contact), or a view without any
/// primary at all. No repair is attempted; the request fails so operators
/// can investigate.
pub(crate) fn verify_cluster(members: &[Contact]) -> Result<()> {
    if !members.iter().any(Contact::is_primary) {
        return Err(Error::Consistency(
            "cluster view contains no primary contact".to_string(),
        ));
    }

    let by_id: BTreeMap<i64, &Contact> = members.iter().map(|c| (c.id, c)).collect();

    for contact in members {
        if contact.is_primary() {
            continue;
        }
        let linked_id = contact.linked_id.ok_or_else(|| {
            Error::Consistency(format!("secondary contact {} has no linked id", contact.id))
        })?;
        match by_id.get(&linked_id) {
            Some(target) if target.is_primary() => {}
            Some(_) => {
                return Err(Error::Consistency(format!(
                    "secondary contact {} is linked to secondary {}",
                    contact.id, linked_id
                )));
            }
            None => {
                return Err(Error::Consistency(format!(
                    "secondary contact {} is linked to missing or deleted contact {}",
                    contact.id, linked_id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlink_common::Precedence;

    fn contact(id: i64, precedence: Precedence, linked_id: Option<i64>) -> Contact {
        Contact {
            id,
            email: Some(format!("c{id}@example.com")),
            phone: None,
            linked_id,
            precedence,
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, id as u32)
                .unwrap(),
            deleted_at: None,
        }
    }

    #[test]
    fn healthy_single_cluster_passes() {
        let members = vec![
            contact(1, Precedence::Primary, None),
            contact(2, Precedence::Secondary, Some(1)),
        ];
        assert!(verify_cluster(&members).is_ok());
    }

    #[test]
    fn bridged_view_with_two_primaries_passes() {
        let members = vec![
            contact(1, Precedence::Primary, None),
            contact(2, Precedence::Primary, None),
            contact(3, Precedence::Secondary, Some(2)),
        ];
        assert!(verify_cluster(&members).is_ok());
    }

    #[test]
    fn secondary_chain_is_a_violation() {
        let members = vec![
            contact(1, Precedence::Primary, None),
            contact(2, Precedence::Secondary, Some(1)),
            contact(3, Precedence::Secondary, Some(2)),
        ];
        assert!(matches!(
            verify_cluster(&members),
            Err(Error::Consistency(_))
        ));
    }

    #[test]
    fn unlinked_secondary_is_a_violation() {
        let members = vec![
            contact(1, Precedence::Primary, None),
            contact(2, Precedence::Secondary, None),
        ];
        assert!(matches!(
            verify_cluster(&members),
            Err(Error::Consistency(_))
        ));
    }

    #[test]
    fn view_without_primary_is_a_violation() {
        let members = vec![contact(2, Precedence::Secondary, Some(1))];
        assert!(matches!(
            verify_cluster(&members),
            Err(Error::Consistency(_))
        ));
    }
}
