//! Schema repair runner
//!
//! Executes a repair plan statement by statement, strictly in order, on one
//! connection. Statement failures are classified and recorded, never thrown;
//! only connection-level failures abort the run. Re-running the whole plan
//! is the retry mechanism - each statement carries its own idempotency guard.

use crate::classifier::{ErrorClassifier, PostgresClassifier};
use crate::error::{RepairError, RepairResult};
use crate::executor::{ExecuteError, PostgresExecutor, SqlExecutor};
use crate::plan::{RepairPlan, StatementKind};
use crate::report::{Outcome, RunReport, RunResult};
use chrono::Utc;
use deadpool_postgres::Pool;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Schema repair runner
///
/// Holds the outcome-classification policy and the failure policy; the
/// connection is supplied per run by the caller, which keeps ownership of it.
pub struct Runner<C = PostgresClassifier> {
    classifier: C,
    fail_fast: bool,
}

impl Runner<PostgresClassifier> {
    /// Runner with the PostgreSQL SQLSTATE classifier
    pub fn postgres() -> Self {
        Self::new(PostgresClassifier)
    }
}

impl<C: ErrorClassifier> Runner<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            fail_fast: false,
        }
    }

    /// Stop at the first failed statement instead of running the full plan
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Execute every statement of the plan in order and report each outcome
    ///
    /// Statements run one at a time, each in its own implicit transaction;
    /// later statements may depend on earlier ones. In the default mode the
    /// run never short-circuits: a failed statement is recorded and the next
    /// one still executes. With fail-fast enabled the report is truncated at
    /// the failing statement.
    ///
    /// Connection-level errors are fatal and propagate immediately; they are
    /// never recorded per-statement.
    pub async fn run<E: SqlExecutor>(
        &self,
        plan: &RepairPlan,
        executor: &mut E,
    ) -> RepairResult<RunReport> {
        let started_at = Utc::now();
        let total = plan.statements.len();
        let mut results = Vec::with_capacity(total);

        for (i, stmt) in plan.statements.iter().enumerate() {
            debug!("[{}/{}] Executing: {}", i + 1, total, stmt.description);
            let start = Instant::now();

            let (outcome, detail, rows_affected) = match executor.execute(&stmt.sql).await {
                Ok(rows) => match stmt.kind {
                    StatementKind::Backfill if rows == 0 => (
                        Outcome::AlreadyApplied,
                        "0 rows affected".to_string(),
                        Some(0),
                    ),
                    StatementKind::Backfill => {
                        (Outcome::Applied, format!("{} rows affected", rows), Some(rows))
                    }
                    StatementKind::Schema => (Outcome::Applied, "applied".to_string(), None),
                },
                Err(ExecuteError::Sql(sql_err)) => {
                    if stmt.idempotent && self.classifier.is_already_applied(&sql_err) {
                        (Outcome::AlreadyApplied, sql_err.to_string(), None)
                    } else {
                        (Outcome::Failed, sql_err.to_string(), None)
                    }
                }
                Err(ExecuteError::Connection(msg)) => {
                    return Err(RepairError::Connection(msg));
                }
            };

            debug!(
                "[{}/{}] {} -> {:?}",
                i + 1,
                total,
                stmt.description,
                outcome
            );

            let failed = outcome == Outcome::Failed;
            results.push(RunResult {
                statement: stmt.clone(),
                outcome,
                detail,
                rows_affected,
                duration_ms: start.elapsed().as_millis() as u64,
            });

            if failed && self.fail_fast {
                warn!(
                    "Stopping after statement {}/{} (fail-fast enabled)",
                    i + 1,
                    total
                );
                break;
            }
        }

        Ok(RunReport {
            id: Uuid::new_v4(),
            plan: plan.name.clone(),
            plan_checksum: plan.checksum(),
            started_at,
            finished_at: Utc::now(),
            results,
        })
    }

    /// Run a plan on one client checked out of the pool
    ///
    /// The client is held for the whole run and returned to the pool when
    /// this function exits, on the success and on every error path.
    pub async fn run_pool(&self, plan: &RepairPlan, pool: &Pool) -> RepairResult<RunReport> {
        let client = pool.get().await?;
        let mut executor = PostgresExecutor::new(client);
        self.run(plan, &mut executor).await
    }
}

impl Default for Runner<PostgresClassifier> {
    fn default() -> Self {
        Self::postgres()
    }
}
