//! Execution seam between the runner and the backing store
//!
//! The runner never talks to a driver directly; it hands raw SQL to a
//! [`SqlExecutor`] and gets back an affected-row count or a structured
//! error. Statement-level SQL errors keep their engine code so they can be
//! classified; anything transport-level is split off as a connection error,
//! which is fatal to the whole run.

use deadpool_postgres::Client;
use thiserror::Error;

/// Structured SQL error surfaced by the backing store
#[derive(Debug, Clone)]
pub struct SqlError {
    /// Engine-specific error code (SQLSTATE for PostgreSQL), when available
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Error returned by a [`SqlExecutor`]
#[derive(Error, Debug)]
pub enum ExecuteError {
    /// The statement itself failed; recorded per-statement in the report
    #[error("{0}")]
    Sql(SqlError),

    /// The connection failed; never recorded per-statement
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Executes raw SQL text against the target store
///
/// Each call runs in its own implicit transaction. Implementations assume
/// exclusive use by one runner for the duration of a run.
#[allow(async_fn_in_trait)]
pub trait SqlExecutor {
    /// Execute one statement, returning the number of rows it affected
    async fn execute(&mut self, sql: &str) -> Result<u64, ExecuteError>;
}

/// Executor over a pooled PostgreSQL client
///
/// Owns the checked-out client; dropping the executor returns the client to
/// its pool, whatever state the run ended in.
pub struct PostgresExecutor {
    client: Client,
}

impl PostgresExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl SqlExecutor for PostgresExecutor {
    async fn execute(&mut self, sql: &str) -> Result<u64, ExecuteError> {
        self.client.execute(sql, &[]).await.map_err(map_pg_error)
    }
}

/// Split a driver error into statement-level vs connection-level
///
/// Only errors carrying a SQLSTATE came from the server rejecting the
/// statement; everything else (closed socket, protocol/io failure) means the
/// connection itself is unusable.
fn map_pg_error(e: tokio_postgres::Error) -> ExecuteError {
    if e.is_closed() {
        return ExecuteError::Connection(e.to_string());
    }

    match e.as_db_error() {
        Some(db) => ExecuteError::Sql(SqlError {
            code: Some(db.code().code().to_string()),
            message: db.message().to_string(),
        }),
        None => ExecuteError::Connection(e.to_string()),
    }
}
