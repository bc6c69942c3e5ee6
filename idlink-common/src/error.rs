//! Common error types for idlink

use thiserror::Error;

/// Common result type for idlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for identity reconciliation.
///
/// `InvalidInput` is rejected before any store access and has no side
/// effects. `Database` and `Consistency` both abort the in-flight
/// transaction in full; they are kept as separate variants so a broken
/// invariant detected on read is distinguishable from a plain store
/// failure when operators investigate.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored-data invariant was found broken on read
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
