//! Response returned for every request, successful or not.

use crate::llm::{CandidateQuery, UsageMetadata};
use crate::pipeline::state::{PipelineState, TerminalStatus};
use crate::store::{ExecErrorKind, PlanStep};
use crate::types::{AskError, Row};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one pipeline run.
///
/// Non-success responses carry zero rows and a human-readable
/// `error_message`. `trace` lists the states the request reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub status: TerminalStatus,

    pub understood_question: Option<String>,
    pub clarification: Option<String>,
    pub query_text: Option<String>,
    pub explanation: Option<String>,

    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    /// Statement execution time; the timeout itself when execution timed out
    pub elapsed_ms: f64,

    pub performance_notes: Vec<String>,
    pub plan: Vec<PlanStep>,

    pub error_kind: Option<ExecErrorKind>,
    pub error_message: Option<String>,

    /// Provider token usage, when the translator ran
    pub usage: Option<UsageMetadata>,
    pub trace: Vec<PipelineState>,
}

impl PipelineResponse {
    /// Fresh response for a request that has just been received.
    ///
    /// Status stays `Failed` until the orchestrator settles it.
    pub(crate) fn received(request_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            request_id,
            started_at,
            status: TerminalStatus::Failed,
            understood_question: None,
            clarification: None,
            query_text: None,
            explanation: None,
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            elapsed_ms: 0.0,
            performance_notes: Vec::new(),
            plan: Vec::new(),
            error_kind: None,
            error_message: None,
            usage: None,
            trace: vec![PipelineState::Received],
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub(crate) fn enter(&mut self, state: PipelineState) {
        self.trace.push(state);
    }

    /// Copy what the translator understood onto the response.
    ///
    /// A blocked candidate's query text and explanation are never surfaced.
    pub(crate) fn absorb(&mut self, candidate: &CandidateQuery, translated: bool) {
        self.understood_question = non_empty(&candidate.understood_question);
        self.clarification = candidate.clarification_text().map(String::from);
        if !candidate.is_blocked {
            self.query_text = non_empty(&candidate.query_text);
            self.explanation = non_empty(&candidate.explanation);
        }
        if translated {
            self.usage = Some(candidate.usage.clone());
        }
    }

    pub(crate) fn halt(&mut self, halt: Halt) {
        self.status = halt.status;
        self.error_kind = halt.error_kind;
        self.error_message = Some(halt.message);
        self.columns.clear();
        self.rows.clear();
        self.row_count = 0;
    }
}

/// Early termination of a request.
#[derive(Debug, Clone)]
pub(crate) struct Halt {
    pub status: TerminalStatus,
    pub error_kind: Option<ExecErrorKind>,
    pub message: String,
}

impl From<AskError> for Halt {
    fn from(err: AskError) -> Self {
        Self {
            status: err.terminal_status(),
            error_kind: err.exec_kind(),
            message: err.to_string(),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
