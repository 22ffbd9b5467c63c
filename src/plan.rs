//! Repair plan model
//!
//! A plan is an ordered list of statements to run against the target
//! database. Plans arrive either as JSON documents (the operational binary)
//! or built in code by whatever service embeds the runner.

use crate::error::RepairError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

/// What a statement does, which decides how its result is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// DDL: add a column, extend an enum, create an index
    Schema,
    /// Data repair: a guarded UPDATE/INSERT whose affected-row count matters
    Backfill,
}

impl Default for StatementKind {
    fn default() -> Self {
        StatementKind::Schema
    }
}

/// An atomic schema-or-data-change operation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    #[validate(length(min = 1, max = 255, message = "Statement description is required"))]
    pub description: String,

    #[validate(custom(function = "validate_sql"))]
    pub sql: String,

    /// When true, a duplicate-object error from this statement means the
    /// desired end-state already holds and is not reported as a failure.
    #[serde(default)]
    pub idempotent: bool,

    #[serde(default)]
    pub kind: StatementKind,
}

impl Statement {
    /// Schema-change statement (not idempotent unless marked so)
    pub fn schema(description: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sql: sql.into(),
            idempotent: false,
            kind: StatementKind::Schema,
        }
    }

    /// Data-repair statement; the runner reports its affected-row count
    pub fn backfill(description: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sql: sql.into(),
            idempotent: false,
            kind: StatementKind::Backfill,
        }
    }

    /// Mark the statement as safe to re-run
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }
}

/// Ordered repair plan
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RepairPlan {
    #[validate(length(min = 1, max = 255, message = "Plan name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Plan must contain at least one statement"))]
    #[validate(nested)]
    pub statements: Vec<Statement>,
}

impl RepairPlan {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            statements,
        }
    }

    /// Parse and validate a plan from a JSON document
    pub fn from_json(json: &str) -> Result<Self, RepairError> {
        let plan: RepairPlan = serde_json::from_str(json)
            .map_err(|e| RepairError::Plan(format!("Failed to parse plan: {}", e)))?;
        plan.validate()
            .map_err(|e| RepairError::Plan(format!("Plan validation failed: {}", e)))?;
        Ok(plan)
    }

    /// Load a plan from a JSON file on disk
    pub fn from_path(path: &str) -> Result<Self, RepairError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| RepairError::Plan(format!("Failed to read plan {}: {}", path, e)))?;
        Self::from_json(&json)
    }

    /// Compute checksum from plan content
    ///
    /// Statements are hashed in plan order so reordering changes the
    /// fingerprint, not just editing statement text.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        for stmt in &self.statements {
            hasher.update(format!(
                "{:?}:{}:{}:{}",
                stmt.kind, stmt.idempotent, stmt.description, stmt.sql
            ).as_bytes());
        }
        let result = hasher.finalize();
        format!("{:x}", result)
    }
}

/// Reject statements whose SQL is empty or whitespace
fn validate_sql(sql: &str) -> Result<(), validator::ValidationError> {
    if sql.trim().is_empty() {
        let mut err = validator::ValidationError::new("empty_sql");
        err.message = Some("Statement SQL must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_plan() -> RepairPlan {
        RepairPlan::new(
            "collaborator-links",
            vec![
                Statement::schema(
                    "add branch_id to collaborators",
                    "ALTER TABLE collaborators ADD COLUMN branch_id INTEGER",
                )
                .idempotent(),
                Statement::backfill(
                    "link orphaned collaborators to head office",
                    "UPDATE collaborators SET branch_id = 1 WHERE branch_id IS NULL",
                ),
            ],
        )
    }

    #[test]
    fn test_checksum_consistency() {
        let plan = sample_plan();
        assert_eq!(plan.checksum(), plan.checksum());
    }

    #[test]
    fn test_checksum_changes_with_order() {
        let plan = sample_plan();
        let mut reordered = plan.clone();
        reordered.statements.reverse();
        assert_ne!(plan.checksum(), reordered.checksum());
    }

    #[test]
    fn test_parse_plan_document() {
        let json = r#"{
            "name": "enum-extension",
            "statements": [
                {
                    "description": "allow archived status",
                    "sql": "ALTER TYPE company_status ADD VALUE 'archived'",
                    "idempotent": true
                }
            ]
        }"#;

        let plan = RepairPlan::from_json(json).unwrap();
        assert_eq!(plan.name, "enum-extension");
        assert_eq!(plan.statements.len(), 1);
        assert!(plan.statements[0].idempotent);
        assert_eq!(plan.statements[0].kind, StatementKind::Schema);
    }

    #[test]
    fn test_rejects_empty_plan() {
        let json = r#"{"name": "empty", "statements": []}"#;
        let result = RepairPlan::from_json(json);
        assert!(matches!(result, Err(RepairError::Plan(_))));
    }

    #[test]
    fn test_rejects_blank_sql() {
        let json = r#"{
            "name": "blank",
            "statements": [{"description": "does nothing", "sql": "   "}]
        }"#;
        let result = RepairPlan::from_json(json);
        assert!(matches!(result, Err(RepairError::Plan(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let stmt = Statement::backfill("fix fks", "UPDATE t SET fk = 1 WHERE fk IS NULL");
        assert_eq!(stmt.kind, StatementKind::Backfill);
        assert!(!stmt.idempotent);
    }
}
