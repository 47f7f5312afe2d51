//! Performance diagnosis from the store's execution plan.
//!
//! Notes are advisory and approximate. Static plan notes come first, then
//! timing notes once the query has actually run.

pub mod plan;
pub mod timing;

use crate::store::{PlanStep, QueryStore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use plan::analyze_plan;
pub use timing::append_timing_notes;

/// Execution plan plus the notes derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub plan: Vec<PlanStep>,
    pub notes: Vec<String>,
}

/// Explain `sql` and derive plan notes.
///
/// Never fails: an explain error becomes a single
/// `"Could not analyze query plan: <reason>"` note with an empty plan.
pub async fn diagnose(store: &dyn QueryStore, sql: &str, explain_timeout: Duration) -> Diagnosis {
    match store.explain(sql, explain_timeout).await {
        Ok(plan) => {
            let notes = analyze_plan(&plan, sql);
            tracing::debug!(steps = plan.len(), notes = notes.len(), "query plan analyzed");
            Diagnosis { plan, notes }
        }
        Err(err) => {
            tracing::warn!(error = %err, "explain failed");
            Diagnosis {
                plan: Vec::new(),
                notes: vec![format!("Could not analyze query plan: {}", err)],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RowSet;
    use crate::types::{AskError, Result};
    use async_trait::async_trait;

    struct PlanOnly(Result<Vec<PlanStep>>);

    #[async_trait]
    impl QueryStore for PlanOnly {
        async fn query(&self, _sql: &str, _timeout: Duration) -> Result<RowSet> {
            Ok(RowSet::default())
        }

        async fn explain(&self, _sql: &str, _timeout: Duration) -> Result<Vec<PlanStep>> {
            match &self.0 {
                Ok(plan) => Ok(plan.clone()),
                Err(e) => Err(AskError::ExecutionOperationalError(e.to_string())),
            }
        }

        async fn describe_schema(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_diagnose_full_scan() {
        let store = PlanOnly(Ok(vec![PlanStep::new(2, 0, "SCAN reviews")]));
        let diagnosis = diagnose(&store, "SELECT * FROM reviews", Duration::from_secs(1)).await;
        assert_eq!(diagnosis.plan.len(), 1);
        assert!(diagnosis.notes[0].starts_with("Full table scan detected"));
    }

    #[tokio::test]
    async fn test_diagnose_explain_failure() {
        let store = PlanOnly(Err(AskError::ExecutionOperationalError(
            "no such table: nope".into(),
        )));
        let diagnosis = diagnose(&store, "SELECT * FROM nope", Duration::from_secs(1)).await;
        assert!(diagnosis.plan.is_empty());
        assert_eq!(diagnosis.notes.len(), 1);
        assert!(diagnosis.notes[0].starts_with("Could not analyze query plan:"));
        assert!(diagnosis.notes[0].contains("no such table"));
    }
}
