//! Observation recorder
//!
//! Decides whether an observation introduces a genuinely new identifier
//! combination. A fresh primary is created by the pipeline when no cluster
//! exists at all; this stage only ever adds secondaries to an existing
//! cluster.

use idlink_common::{Contact, Precedence, Result};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::Observation;
use crate::db::contacts;

/// Whether the observation's exact `(email, phone)` pair is already stored
/// in the cluster (pure).
pub fn is_known_pair(observation: &Observation, members: &[Contact]) -> bool {
    members.iter().any(|c| observation.matches_pair(c))
}

/// Record the observation against an existing cluster, returning the
/// possibly-extended membership.
///
/// A one-sided observation never creates a secondary: it cannot express a
/// combination distinct from what is already known through the matched
/// field.
pub async fn record(
    conn: &mut SqliteConnection,
    observation: &Observation,
    survivor: &Contact,
    mut members: Vec<Contact>,
) -> Result<Vec<Contact>> {
    if is_known_pair(observation, &members) {
        debug!("observation carries no new information; no write");
        return Ok(members);
    }

    let (Some(email), Some(phone)) = (observation.email.as_deref(), observation.phone.as_deref())
    else {
        debug!("one-sided observation against existing cluster; no write");
        return Ok(members);
    };

    let created = contacts::insert(
        conn,
        Some(email),
        Some(phone),
        Some(survivor.id),
        Precedence::Secondary,
    )
    .await?;
    info!(
        "created secondary contact {} under primary {}",
        created.id, survivor.id
    );
    members.push(created);

    Ok(members)
}
