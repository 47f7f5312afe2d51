//! Request orchestration.
//!
//! Received -> PolicyChecked -> Translated -> Validated -> Executed -> Diagnosed
//!
//! Each stage can end the request early; the first failing stage decides the
//! terminal status. Raw queries start at Translated and still go through
//! validation, execution and diagnosis.

use crate::analyze::{append_timing_notes, diagnose};
use crate::config::{Config, DEFAULT_EXPLAIN_TIMEOUT_MS, DEFAULT_QUERY_TIMEOUT_SECS};
use crate::guard::{check_question, validate_query};
use crate::llm::{CandidateQuery, LlmTranslator, QueryTranslator};
use crate::otel::{record_request_outcome, request_span, stage_span};
use crate::pipeline::response::{Halt, PipelineResponse};
use crate::pipeline::state::{PipelineState, TerminalStatus};
use crate::schema::SchemaDescription;
use crate::store::{execute, QueryStore, SqliteStore};
use crate::types::{AskError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Note attached when the translator produced no query at all.
pub const NOTHING_EXECUTED_NOTE: &str = "No query was generated; nothing was executed.";

/// Entry point of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineRequest {
    /// Natural-language question; goes through the prefilter and translator
    Question(String),
    /// Query text supplied directly; starts at validation
    RawQuery(String),
}

impl PipelineRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Question(_) => "question",
            Self::RawQuery(_) => "raw_query",
        }
    }
}

/// Timeouts applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub query_timeout: Duration,
    pub explain_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            explain_timeout: Duration::from_millis(DEFAULT_EXPLAIN_TIMEOUT_MS),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            query_timeout: config.query_timeout(),
            explain_timeout: config.explain_timeout(),
        }
    }
}

/// Guarded question-to-result pipeline.
///
/// Holds no per-request state; share it behind an `Arc` and call [`run`]
/// concurrently.
///
/// [`run`]: Pipeline::run
pub struct Pipeline {
    translator: Arc<dyn QueryTranslator>,
    store: Arc<dyn QueryStore>,
    schema: String,
    options: PipelineOptions,
}

impl Pipeline {
    /// Create pipeline.
    ///
    /// # Arguments
    ///
    /// * `translator` - Question-to-query translator
    /// * `store` - Read-only store queries run against
    /// * `schema` - Schema description handed to the translator
    /// * `options` - Execution and explain timeouts
    pub fn new(
        translator: Arc<dyn QueryTranslator>,
        store: Arc<dyn QueryStore>,
        schema: impl Into<String>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            translator,
            store,
            schema: schema.into(),
            options,
        }
    }

    /// Pipeline that only accepts raw queries.
    ///
    /// Questions end as `TranslationFailed`.
    pub fn without_translator(store: Arc<dyn QueryStore>, options: PipelineOptions) -> Self {
        Self::new(Arc::new(Unconfigured), store, String::new(), options)
    }

    /// Build the SQLite + LLM pipeline described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AskError::ConfigError` if the database file is missing or no
    /// API key is configured, `AskError::SchemaError` if the schema file
    /// cannot be read
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)?;
        let translator = LlmTranslator::from_config(config)?;
        let schema = SchemaDescription::resolve(config)?;

        Ok(Self::new(
            Arc::new(translator),
            Arc::new(store),
            schema.text,
            PipelineOptions::from_config(config),
        ))
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    pub async fn ask(&self, question: impl Into<String>) -> PipelineResponse {
        self.run(PipelineRequest::Question(question.into())).await
    }

    pub async fn run_query(&self, query_text: impl Into<String>) -> PipelineResponse {
        self.run(PipelineRequest::RawQuery(query_text.into())).await
    }

    /// Run a request to its terminal status.
    ///
    /// Never fails: errors become the response's status and `error_message`.
    pub async fn run(&self, request: PipelineRequest) -> PipelineResponse {
        let request_id = Uuid::new_v4();
        let span = request_span(&request_id.to_string(), request.kind());
        let started = Instant::now();

        let mut response = PipelineResponse::received(request_id, Utc::now());
        match self.drive(request, &mut response).instrument(span.clone()).await {
            Ok(()) => response.status = TerminalStatus::Succeeded,
            Err(halt) => response.halt(halt),
        }

        let total_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_request_outcome(&span, response.status.as_str(), total_ms);
        span.in_scope(|| {
            tracing::info!(
                status = %response.status,
                rows = response.row_count,
                elapsed_ms = response.elapsed_ms,
                "request finished"
            );
        });

        response
    }

    async fn drive(
        &self,
        request: PipelineRequest,
        response: &mut PipelineResponse,
    ) -> std::result::Result<(), Halt> {
        let (candidate, translated) = match request {
            PipelineRequest::Question(question) => {
                let verdict = stage_span("policy_check").in_scope(|| check_question(&question));
                if let Some(term) = verdict.matched_term {
                    tracing::info!(term = %term, "question blocked by prefilter");
                    return Err(AskError::PolicyBlocked(term).into());
                }
                response.enter(PipelineState::PolicyChecked);

                let candidate = self
                    .translator
                    .translate(&question, &self.schema)
                    .instrument(stage_span("translate"))
                    .await?;
                (candidate, true)
            }
            PipelineRequest::RawQuery(query_text) => (CandidateQuery::raw(query_text), false),
        };

        response.enter(PipelineState::Translated);
        response.absorb(&candidate, translated);

        if candidate.is_blocked {
            return Err(AskError::CandidateBlocked(candidate.blocked_reason()).into());
        }

        let verdict = stage_span("validate").in_scope(|| validate_query(&candidate.query_text));
        if !verdict.is_safe {
            let reason = verdict.reason.unwrap_or_else(|| "Query failed validation".to_string());
            tracing::info!(reason = %reason, "candidate query rejected");
            return Err(AskError::UnsafeQuery(reason).into());
        }
        response.enter(PipelineState::Validated);

        let sql = candidate.query_text.as_str();
        if sql.trim().is_empty() {
            response.performance_notes.push(NOTHING_EXECUTED_NOTE.to_string());
            return Ok(());
        }

        let result = execute(self.store.as_ref(), sql, self.options.query_timeout)
            .instrument(stage_span("execute"))
            .await;
        response.elapsed_ms = result.elapsed_ms;
        if !result.success {
            return Err(Halt {
                status: TerminalStatus::Failed,
                error_kind: result.error_kind,
                message: result
                    .error_message
                    .unwrap_or_else(|| "Query execution failed".to_string()),
            });
        }
        response.columns = result.columns;
        response.rows = result.rows;
        response.row_count = result.row_count;
        response.enter(PipelineState::Executed);

        let diagnosis = diagnose(self.store.as_ref(), sql, self.options.explain_timeout)
            .instrument(stage_span("diagnose"))
            .await;
        response.plan = diagnosis.plan;
        response.performance_notes.extend(diagnosis.notes);
        append_timing_notes(&mut response.performance_notes, response.elapsed_ms);
        response.enter(PipelineState::Diagnosed);

        Ok(())
    }
}

/// Translator stand-in for pipelines built without LLM credentials.
struct Unconfigured;

#[async_trait]
impl QueryTranslator for Unconfigured {
    async fn translate(
        &self,
        _question: &str,
        _schema_description: &str,
    ) -> Result<CandidateQuery> {
        Err(AskError::translation("no translator configured"))
    }
}
