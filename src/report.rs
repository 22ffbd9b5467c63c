//! Run reporting
//!
//! One `RunResult` per statement, in execution order, wrapped in a
//! `RunReport` the caller consumes immediately for logging and exit-code
//! decisions. Reports are not persisted.

use crate::plan::Statement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Terminal state of one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Executed and changed the database
    Applied,
    /// The desired end-state was already present; not a failure
    AlreadyApplied,
    /// Execution failed for a reason other than "already applied"
    Failed,
}

/// Outcome of executing one statement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub statement: Statement,
    pub outcome: Outcome,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    pub duration_ms: u64,
}

/// Ordered report of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub id: Uuid,
    pub plan: String,
    pub plan_checksum: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<RunResult>,
}

impl RunReport {
    /// Whether any statement ended up `Failed`
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.outcome == Outcome::Failed)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn applied(&self) -> usize {
        self.count(Outcome::Applied)
    }

    pub fn already_applied(&self) -> usize {
        self.count(Outcome::AlreadyApplied)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    /// One-line rollup for the final log message
    pub fn summary(&self) -> String {
        format!(
            "{} applied, {} already applied, {} failed",
            self.applied(),
            self.already_applied(),
            self.failed()
        )
    }

    /// Log every result in execution order
    pub fn emit(&self) {
        let total = self.results.len();
        for (i, result) in self.results.iter().enumerate() {
            match result.outcome {
                Outcome::Applied => info!(
                    "[{}/{}] {} - applied ({}, {} ms)",
                    i + 1,
                    total,
                    result.statement.description,
                    result.detail,
                    result.duration_ms
                ),
                Outcome::AlreadyApplied => info!(
                    "[{}/{}] {} - already applied: {}",
                    i + 1,
                    total,
                    result.statement.description,
                    result.detail
                ),
                Outcome::Failed => warn!(
                    "[{}/{}] {} - FAILED: {}",
                    i + 1,
                    total,
                    result.statement.description,
                    result.detail
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Statement;

    fn result(description: &str, outcome: Outcome) -> RunResult {
        RunResult {
            statement: Statement::schema(description, "SELECT 1"),
            outcome,
            detail: String::new(),
            rows_affected: None,
            duration_ms: 1,
        }
    }

    fn report(results: Vec<RunResult>) -> RunReport {
        RunReport {
            id: Uuid::new_v4(),
            plan: "test".to_string(),
            plan_checksum: "deadbeef".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            results,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = report(vec![
            result("a", Outcome::Applied),
            result("b", Outcome::AlreadyApplied),
            result("c", Outcome::AlreadyApplied),
            result("d", Outcome::Failed),
        ]);

        assert_eq!(report.applied(), 1);
        assert_eq!(report.already_applied(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.summary(), "1 applied, 2 already applied, 1 failed");
    }

    #[test]
    fn test_has_failures() {
        let clean = report(vec![result("a", Outcome::AlreadyApplied)]);
        assert!(!clean.has_failures());

        let broken = report(vec![result("a", Outcome::Failed)]);
        assert!(broken.has_failures());
    }
}
