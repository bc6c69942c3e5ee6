//! # idlink Common Library
//!
//! Shared code for the idlink identity reconciliation service:
//! - Error taxonomy and result type
//! - Database initialization and shared models
//! - Write-transaction guard
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;

pub use db::models::{Contact, Precedence};
pub use error::{Error, Result};
