//! Database operation instrumentation.

use sqlparser::ast::visit_relations;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::{field, span, Level, Span};

/// Tables referenced by a statement, in order of first appearance.
///
/// Common table expression names are reported like any other relation.
/// Statements the parser cannot read yield an empty list; this is only
/// used for span attributes and never affects execution.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let statements = match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) => statements,
        Err(_) => return Vec::new(),
    };

    let mut tables: Vec<String> = Vec::new();
    let _ = visit_relations(&statements, |relation| {
        let name = relation.to_string();
        if !tables.contains(&name) {
            tables.push(name);
        }
        ControlFlow::<()>::Continue(())
    });
    tables
}

/// Create query execution span.
///
/// # Arguments
///
/// * `query_text` - Statement as it will be executed
///
/// # Returns
///
/// Tracing span with query attributes; `db.response.returned_rows` and
/// `db.response.elapsed_ms` are filled in by [`record_db_metrics`]
///
/// # Example
///
/// ```rust,ignore
/// let span = db_query_span("SELECT store_name FROM reviews");
/// let rows = run().instrument(span).await?;
/// ```
pub fn db_query_span(query_text: &str) -> Span {
    operation_span("query", query_text)
}

/// Create explain-plan span.
pub fn db_explain_span(query_text: &str) -> Span {
    operation_span("explain", query_text)
}

fn operation_span(operation: &'static str, query_text: &str) -> Span {
    let collection = referenced_tables(query_text).join(",");

    // Span name: "{operation} {collection}" or just "{operation}"
    let span_name = if collection.is_empty() {
        operation.to_string()
    } else {
        format!("{} {}", operation, collection)
    };

    span!(
        Level::INFO,
        "db",
        otel.name = %span_name,
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = operation,
        db.collection.name = %collection,
        db.query.text = query_text,
        db.response.returned_rows = field::Empty,
        db.response.elapsed_ms = field::Empty,
    )
}

/// Record query metrics in the current span.
///
/// # Arguments
///
/// * `rows_returned` - Number of rows materialized
/// * `elapsed` - Statement wall-clock time
pub fn record_db_metrics(rows_returned: usize, elapsed: Duration) {
    let span = Span::current();
    span.record("db.response.returned_rows", rows_returned);
    span.record("db.response.elapsed_ms", elapsed.as_secs_f64() * 1000.0);
}
