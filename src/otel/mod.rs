//! Tracing instrumentation for askdb.
//!
//! Span attributes follow the OpenTelemetry semantic conventions so the
//! spans can be exported as-is by any OTLP-aware subscriber:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//!
//! # Database spans
//!
//! **Span naming**: `{db.operation.name} {db.collection.name}`
//! - Example: `query reviews`, `explain reviews`
//!
//! **Attributes**:
//! - `db.system.name`: Always `"sqlite"`
//! - `db.collection.name`: Tables referenced by the statement
//! - `db.query.text`: The statement as executed
//! - `db.response.returned_rows`: Recorded after execution
//!
//! # Pipeline spans
//!
//! One INTERNAL span per request (`askdb.request`) with a child span per
//! stage (`askdb.stage`). The terminal status is recorded on the request span.

pub mod db;
pub mod pipeline;

pub use db::{db_explain_span, db_query_span, record_db_metrics, referenced_tables};
pub use pipeline::{record_request_outcome, request_span, stage_span};
