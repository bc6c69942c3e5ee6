//! Database initialization, shared models, and transaction guard

pub mod init;
pub mod models;
pub mod tx;

pub use init::*;
pub use models::*;
pub use tx::*;
