//! Notes derived from measured execution time.

/// Above this, warn strongly.
pub const SLOW_QUERY_MS: f64 = 5_000.0;

/// From this up to [`SLOW_QUERY_MS`], suggest monitoring.
pub const MONITOR_QUERY_MS: f64 = 1_000.0;

/// Append a timing note for a successful execution.
///
/// Existing notes are never reordered or removed.
pub fn append_timing_notes(notes: &mut Vec<String>, elapsed_ms: f64) {
    if elapsed_ms > SLOW_QUERY_MS {
        notes.push(format!(
            "Query took {:.0}ms. Consider optimization for production.",
            elapsed_ms
        ));
    } else if elapsed_ms >= MONITOR_QUERY_MS {
        notes.push(format!(
            "Query took {:.0}ms. Acceptable but monitor on larger datasets.",
            elapsed_ms
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_query_appended_last() {
        let mut notes = vec!["Full table scan detected.".to_string()];
        append_timing_notes(&mut notes, 6000.0);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], "Full table scan detected.");
        assert_eq!(notes[1], "Query took 6000ms. Consider optimization for production.");
    }

    #[test]
    fn test_boundaries() {
        let mut notes = Vec::new();
        append_timing_notes(&mut notes, 999.9);
        assert!(notes.is_empty());

        append_timing_notes(&mut notes, 1000.0);
        assert_eq!(notes, vec!["Query took 1000ms. Acceptable but monitor on larger datasets."]);

        let mut notes = Vec::new();
        append_timing_notes(&mut notes, 5000.0);
        assert!(notes[0].contains("monitor"));

        let mut notes = Vec::new();
        append_timing_notes(&mut notes, 5000.4);
        assert!(notes[0].contains("Consider optimization"));
    }
}
