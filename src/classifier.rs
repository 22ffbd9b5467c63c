//! Error classification
//!
//! Telling "operation intrinsically failed" apart from "operation's effect
//! already exists" is engine-specific. The runner depends only on the
//! [`ErrorClassifier`] trait; each supported engine gets its own
//! implementation.

use crate::executor::SqlError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Decides whether a statement error means the desired end-state already holds
pub trait ErrorClassifier: Send + Sync {
    fn is_already_applied(&self, error: &SqlError) -> bool;
}

/// SQLSTATE codes PostgreSQL raises when the target object already exists
const DUPLICATE_SQLSTATES: &[&str] = &[
    "23505", // unique_violation (re-run of a guarded INSERT)
    "42701", // duplicate_column
    "42710", // duplicate_object (enum values, constraints)
    "42723", // duplicate_function
    "42P04", // duplicate_database
    "42P06", // duplicate_schema
    "42P07", // duplicate_table / index
];

/// Classifier for PostgreSQL, keyed on SQLSTATE
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresClassifier;

impl ErrorClassifier for PostgresClassifier {
    fn is_already_applied(&self, error: &SqlError) -> bool {
        match &error.code {
            Some(code) => DUPLICATE_SQLSTATES.contains(&code.as_str()),
            None => false,
        }
    }
}

static DEFAULT_DUPLICATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)already exists|duplicate").unwrap());

/// Classifier for engines that expose no structured error code
///
/// Matches the error message against a set of patterns instead. Last resort;
/// prefer a code-based classifier when the driver surfaces one.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    patterns: Vec<Regex>,
}

impl PatternClassifier {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_DUPLICATE_PATTERN.clone()],
        }
    }
}

impl ErrorClassifier for PatternClassifier {
    fn is_already_applied(&self, error: &SqlError) -> bool {
        self.patterns.iter().any(|p| p.is_match(&error.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_error(code: Option<&str>, message: &str) -> SqlError {
        SqlError {
            code: code.map(String::from),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_postgres_duplicate_column() {
        let classifier = PostgresClassifier;
        let err = sql_error(Some("42701"), "column \"a\" of relation \"t\" already exists");
        assert!(classifier.is_already_applied(&err));
    }

    #[test]
    fn test_postgres_duplicate_enum_value() {
        let classifier = PostgresClassifier;
        let err = sql_error(Some("42710"), "enum label \"archived\" already exists");
        assert!(classifier.is_already_applied(&err));
    }

    #[test]
    fn test_postgres_syntax_error_is_not_already_applied() {
        let classifier = PostgresClassifier;
        let err = sql_error(Some("42601"), "syntax error at or near \"ALTR\"");
        assert!(!classifier.is_already_applied(&err));
    }

    #[test]
    fn test_postgres_requires_a_code() {
        let classifier = PostgresClassifier;
        let err = sql_error(None, "something already exists");
        assert!(!classifier.is_already_applied(&err));
    }

    #[test]
    fn test_pattern_classifier_matches_message() {
        let classifier = PatternClassifier::default();
        let err = sql_error(None, "Duplicate column name 'branch_id'");
        assert!(classifier.is_already_applied(&err));
    }

    #[test]
    fn test_pattern_classifier_ignores_other_messages() {
        let classifier = PatternClassifier::default();
        let err = sql_error(None, "permission denied for table collaborators");
        assert!(!classifier.is_already_applied(&err));
    }
}
