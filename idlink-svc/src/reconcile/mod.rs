//! Reconciliation core
//!
//! One inbound observation runs through four stages, strictly in order and
//! inside one write transaction: the locator assembles the full cluster view
//! touching the observation's identifiers, the merger collapses the view to
//! a single surviving primary, the recorder persists the observation if it
//! carries new information, and the projection builder assembles the
//! externally visible result.

pub mod locator;
pub mod merger;
pub mod projection;
pub mod recorder;

use idlink_common::db::tx::WriteTx;
use idlink_common::{Contact, Error, Precedence, Result};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::db::contacts;

/// One inbound `(email?, phone?)` pair to reconcile against stored data.
///
/// Identifiers are carried verbatim; the only normalization applied is that
/// blank or whitespace-only strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Observation {
    pub fn new(email: Option<String>, phone: Option<String>) -> Self {
        Self {
            email: normalize(email),
            phone: normalize(phone),
        }
    }

    /// At least one identifier must be present.
    pub fn validate(&self) -> Result<()> {
        if self.email.is_none() && self.phone.is_none() {
            return Err(Error::InvalidInput(
                "at least one of email or phone is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Exact `(email, phone)` pair equality against a stored contact.
    /// An absent field matches only an absent field, never as a wildcard.
    pub fn matches_pair(&self, contact: &Contact) -> bool {
        self.email == contact.email && self.phone == contact.phone
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Cluster membership touching an observation, or the explicit absence of
/// one (which tells the recorder to create a fresh primary).
#[derive(Debug, Clone)]
pub enum ClusterView {
    /// No stored contact touches either identifier.
    None,
    /// Full membership of every cluster touching the observation, sorted by
    /// ascending `(created_at, id)`. May hold more than one primary until
    /// the merger has run.
    Found(Vec<Contact>),
}

/// The externally visible result of reconciling one observation.
///
/// Ordering is a contract: the primary's own identifiers come first in each
/// array, followed by the rest of the cluster in ascending creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProjection {
    pub primary_contact_id: i64,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<i64>,
}

/// Reconcile one observation and return the resolved identity projection.
///
/// The entire locate -> merge -> record sequence executes under a single
/// `BEGIN IMMEDIATE` transaction, so two concurrent observations against
/// the same cluster cannot both pass the duplicate check or independently
/// merge the same demoted primary. Any error rolls the transaction back in
/// full; no partial merge or insert is ever observable.
pub async fn identify(pool: &SqlitePool, observation: &Observation) -> Result<IdentityProjection> {
    // Rejected before any store access
    observation.validate()?;

    let mut tx = WriteTx::begin(pool).await?;
    let outcome = resolve(tx.conn()?, observation).await;
    match outcome {
        Ok(projection) => {
            tx.commit().await?;
            Ok(projection)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

async fn resolve(
    conn: &mut SqliteConnection,
    observation: &Observation,
) -> Result<IdentityProjection> {
    match locator::locate(conn, observation).await? {
        ClusterView::None => {
            let created = contacts::insert(
                conn,
                observation.email.as_deref(),
                observation.phone.as_deref(),
                None,
                Precedence::Primary,
            )
            .await?;
            info!("created new primary contact {}", created.id);
            Ok(projection::project(&created, std::slice::from_ref(&created)))
        }
        ClusterView::Found(members) => {
            let plan = merger::plan_merge(&members)?;
            let members = merger::apply(conn, members, &plan).await?;
            let survivor = members
                .iter()
                .find(|c| c.id == plan.survivor_id)
                .cloned()
                .ok_or_else(|| {
                    Error::Consistency(format!(
                        "surviving primary {} missing from post-merge cluster",
                        plan.survivor_id
                    ))
                })?;
            let members = recorder::record(conn, observation, &survivor, members).await?;
            Ok(projection::project(&survivor, &members))
        }
    }
}
