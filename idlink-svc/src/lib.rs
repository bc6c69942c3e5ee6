//! # idlink Identity Reconciliation Service
//!
//! Resolves partial, possibly-overlapping contact observations (an email
//! and/or a phone number) into one canonical identity cluster, merging
//! clusters when an observation bridges two previously separate identities.
//!
//! The crate is split between a thin HTTP adapter ([`api`]), the contact
//! store queries ([`db`]), and the reconciliation core ([`reconcile`]),
//! which runs its whole pipeline inside one write transaction per request.

pub mod api;
pub mod db;
pub mod reconcile;

pub use reconcile::{IdentityProjection, Observation};
