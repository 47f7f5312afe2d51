//! Execution engine over a read-only relational store.
//!
//! `QueryStore` is the seam to the data store; `execute` turns a store call
//! into a fully materialized [`ExecutionResult`] with a classified error.

pub mod sqlite;

use crate::types::{AskError, Result, Row};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use sqlite::SqliteStore;

/// Execution failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecErrorKind {
    Timeout,
    OperationalError,
    UnknownError,
}

impl fmt::Display for ExecErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "Timeout",
            Self::OperationalError => "OperationalError",
            Self::UnknownError => "UnknownError",
        };
        f.write_str(name)
    }
}

/// Materialized rows from a successful statement.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Wall-clock time of the statement itself (monotonic clock)
    pub elapsed: Duration,
}

/// One row of the store's execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: i64,
    pub parent: i64,
    pub detail: String,
}

impl PlanStep {
    pub fn new(id: i64, parent: i64, detail: impl Into<String>) -> Self {
        Self {
            id,
            parent,
            detail: detail.into(),
        }
    }
}

/// Read-only store able to run and explain single statements.
///
/// Implementations must not share connection state between calls: every
/// call is its own session, so concurrent requests never observe each other.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Run a statement and materialize every row.
    ///
    /// # Errors
    ///
    /// Returns `AskError::ExecutionTimeout` when `timeout` elapses (the
    /// statement is cancelled), otherwise `ExecutionOperationalError` or
    /// `ExecutionUnknownError`
    async fn query(&self, sql: &str, timeout: Duration) -> Result<RowSet>;

    /// Describe how the statement would run, without running it.
    async fn explain(&self, sql: &str, timeout: Duration) -> Result<Vec<PlanStep>>;

    /// Human-readable schema description.
    async fn describe_schema(&self) -> Result<String>;
}

/// Outcome of executing a validated query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub elapsed_ms: f64,
    pub error_kind: Option<ExecErrorKind>,
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// Success record from a row set.
    pub fn from_rows(rows: RowSet) -> Self {
        Self {
            success: true,
            row_count: rows.rows.len(),
            elapsed_ms: round_ms(rows.elapsed),
            columns: rows.columns,
            rows: rows.rows,
            error_kind: None,
            error_message: None,
        }
    }

    /// Failure record: zero rows, classified error.
    ///
    /// Timeouts report the timeout itself as elapsed time.
    pub fn from_error(err: &AskError, timeout: Duration) -> Self {
        let kind = err.exec_kind().unwrap_or(ExecErrorKind::UnknownError);
        let elapsed_ms = match kind {
            ExecErrorKind::Timeout => round_ms(timeout),
            _ => 0.0,
        };

        Self {
            success: false,
            elapsed_ms,
            error_kind: Some(kind),
            error_message: Some(err.to_string()),
            ..Self::default()
        }
    }
}

/// Execute a validated query with a timeout.
///
/// Never returns partial rows: either every row or none.
pub async fn execute(store: &dyn QueryStore, sql: &str, timeout: Duration) -> ExecutionResult {
    match store.query(sql, timeout).await {
        Ok(rows) => {
            tracing::debug!(rows = rows.rows.len(), elapsed_ms = ?rows.elapsed, "query executed");
            ExecutionResult::from_rows(rows)
        }
        Err(err) => {
            tracing::warn!(error = %err, "query execution failed");
            ExecutionResult::from_error(&err, timeout)
        }
    }
}

fn round_ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 100_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_from_rows_counts_rows() {
        let rows = RowSet {
            columns: vec!["n".into()],
            rows: vec![Row::new(vec![Value::Integer(1)]), Row::new(vec![Value::Integer(2)])],
            elapsed: Duration::from_micros(1_234_567),
        };
        let result = ExecutionResult::from_rows(rows);
        assert!(result.success);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.elapsed_ms, 1234.57);
        assert!(result.error_kind.is_none());
    }

    #[test]
    fn test_from_error_has_no_rows() {
        let err = AskError::ExecutionTimeout(2_000);
        let result = ExecutionResult::from_error(&err, Duration::from_secs(2));
        assert!(!result.success);
        assert!(result.rows.is_empty());
        assert_eq!(result.row_count, 0);
        assert_eq!(result.error_kind, Some(ExecErrorKind::Timeout));
        assert_eq!(result.elapsed_ms, 2000.0);

        let err = AskError::ExecutionOperationalError("no such table: x".into());
        let result = ExecutionResult::from_error(&err, Duration::from_secs(2));
        assert_eq!(result.error_kind, Some(ExecErrorKind::OperationalError));
        assert_eq!(result.elapsed_ms, 0.0);
        assert!(result.error_message.unwrap().contains("no such table"));
    }

    #[test]
    fn test_exec_error_kind_display() {
        assert_eq!(ExecErrorKind::OperationalError.to_string(), "OperationalError");
    }
}
