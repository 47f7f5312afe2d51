//! Text renderings of pipeline responses for the CLI.

use crate::pipeline::PipelineResponse;
use crate::store::PlanStep;
use crate::types::{AskError, Result, Row};
use std::fmt::Write as _;

/// Widest cell shown in table output, in characters.
pub const CELL_WIDTH: usize = 30;

/// Default number of rows shown in table output.
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Pipe-separated result table with totals.
///
/// At most `max_rows` rows are shown; cells are cut to [`CELL_WIDTH`].
pub fn format_table(response: &PipelineResponse, max_rows: usize) -> String {
    if !response.is_success() {
        return format!(
            "ERROR ({}): {}",
            response.status,
            response.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    if response.rows.is_empty() {
        return "No results found.".to_string();
    }

    let mut out = String::new();
    let header = response.columns.join(" | ");
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", "-".repeat(header.chars().count()));

    for row in response.rows.iter().take(max_rows) {
        let cells: Vec<String> = row.values().iter().map(|v| truncate(&v.to_string())).collect();
        let _ = writeln!(out, "{}", cells.join(" | "));
    }
    if response.row_count > max_rows {
        let _ = writeln!(out, "... and {} more rows", response.row_count - max_rows);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total rows: {}", response.row_count);
    let _ = write!(out, "Execution time: {}ms", response.elapsed_ms);
    out
}

/// Plan rows followed by performance notes.
pub fn format_plan(plan: &[PlanStep], notes: &[String]) -> String {
    let mut out = String::from("QUERY PLAN:\n");
    if plan.is_empty() {
        out.push_str("  No plan available\n");
    }
    for step in plan {
        let _ = writeln!(out, "  ({}, {}) {}", step.id, step.parent, step.detail);
    }

    out.push_str("\nPERFORMANCE NOTES:");
    for note in notes {
        let _ = write!(out, "\n  {}", note);
    }
    out
}

/// CSV with a header row; NULL becomes an empty field.
pub fn to_csv(columns: &[String], rows: &[Row]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns).map_err(csv_error)?;
    for row in rows {
        let fields = row
            .values()
            .iter()
            .map(|v| if v.is_null() { String::new() } else { v.to_string() });
        writer.write_record(fields).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AskError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| AskError::Io(std::io::Error::other(e)))
}

fn csv_error(err: csv::Error) -> AskError {
    AskError::Io(std::io::Error::other(err.to_string()))
}

fn truncate(cell: &str) -> String {
    cell.chars().take(CELL_WIDTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TerminalStatus;
    use crate::types::Value;
    use chrono::Utc;
    use uuid::Uuid;

    fn response(rows: usize) -> PipelineResponse {
        let mut response = PipelineResponse::received(Uuid::new_v4(), Utc::now());
        response.status = TerminalStatus::Succeeded;
        response.columns = vec!["store_name".into(), "n".into()];
        response.elapsed_ms = 1.5;
        response.rows = (0..rows)
            .map(|i| Row::new(vec![Value::Text("x".repeat(40)), Value::Integer(i as i64)]))
            .collect();
        response.row_count = rows;
        response
    }

    #[test]
    fn test_table_truncates_cells_and_rows() {
        let table = format_table(&response(25), DEFAULT_MAX_ROWS);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "store_name | n");
        assert_eq!(lines[2], format!("{} | 0", "x".repeat(30)));
        assert!(table.contains("... and 5 more rows"));
        assert!(table.contains("Total rows: 25"));
    }

    #[test]
    fn test_table_for_failure() {
        let mut failed = response(0);
        failed.status = TerminalStatus::Rejected;
        failed.error_message =
            Some("Unsafe query: Blocked: DELETE statements are not allowed".into());
        assert!(format_table(&failed, 20).starts_with("ERROR (Rejected): Unsafe query"));
        assert_eq!(format_table(&response(0), 20), "No results found.");
    }

    #[test]
    fn test_plan_rendering() {
        let text = format_plan(
            &[PlanStep::new(2, 0, "SCAN reviews")],
            &["Full table scan detected.".to_string()],
        );
        assert!(text.contains("  (2, 0) SCAN reviews"));
        assert!(text.ends_with("PERFORMANCE NOTES:\n  Full table scan detected."));
    }

    #[test]
    fn test_csv_export() {
        let columns = vec!["store".to_string(), "note".to_string()];
        let rows = vec![Row::new(vec![Value::Text("Canal Walk, CT".into()), Value::Null])];
        let csv = to_csv(&columns, &rows).unwrap();
        assert_eq!(csv, "store,note\n\"Canal Walk, CT\",\n");
    }
}
