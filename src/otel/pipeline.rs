//! Request and stage instrumentation.
//!
//! Pipeline stages are not database client operations, so these spans use
//! the INTERNAL span kind.

use tracing::{field, span, Level, Span};

/// Create the per-request span.
///
/// # Arguments
///
/// * `request_id` - Request identifier (UUID)
/// * `kind` - `"question"` or `"raw_query"`
///
/// # Example
///
/// ```rust,ignore
/// let span = request_span(&request_id, "question");
/// let response = run_stages().instrument(span).await;
/// ```
pub fn request_span(request_id: &str, kind: &'static str) -> Span {
    span!(
        Level::INFO,
        "askdb.request",
        otel.name = %format!("askdb {}", kind),
        otel.kind = "internal",
        request.id = request_id,
        request.kind = kind,
        request.status = field::Empty,
        request.elapsed_ms = field::Empty,
    )
}

/// Create a span for one pipeline stage.
pub fn stage_span(stage: &'static str) -> Span {
    span!(
        Level::INFO,
        "askdb.stage",
        otel.name = stage,
        otel.kind = "internal",
        stage.name = stage,
    )
}

/// Record the terminal status on a request span.
pub fn record_request_outcome(span: &Span, status: &str, elapsed_ms: f64) {
    span.record("request.status", status);
    span.record("request.elapsed_ms", elapsed_ms);
}
