//! Error handling module
//!
//! Provides unified error types for the repair runner and its callers.

use thiserror::Error;

/// Crate-wide error type
///
/// Every variant here is fatal to a whole run: connection-level failures,
/// bad configuration, or an unusable plan. Per-statement SQL failures are
/// never surfaced through this type; they are classified and recorded in
/// the [`RunReport`](crate::report::RunReport) instead.
#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid repair plan: {0}")]
    Plan(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for runner operations
pub type RepairResult<T> = Result<T, RepairError>;

/// Helper function to create a connection error
pub fn connection_error(msg: impl Into<String>) -> RepairError {
    RepairError::Connection(msg.into())
}

/// Helper function to create a plan error
pub fn plan_error(msg: impl Into<String>) -> RepairError {
    RepairError::Plan(msg.into())
}
