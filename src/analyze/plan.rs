//! Heuristics over `EXPLAIN QUERY PLAN` output.
//!
//! Markers cover both current SQLite output (`SCAN reviews`,
//! `SEARCH reviews USING INDEX ...`, `USE TEMP B-TREE FOR ORDER BY`) and the
//! legacy form (`SCAN TABLE reviews`).

use crate::guard::patterns::SORT_CLAUSES;
use crate::store::PlanStep;

const INDEX_MARKERS: [&str; 4] = [
    "USING INDEX",
    "USING COVERING INDEX",
    "USING INTEGER PRIMARY KEY",
    "USING PRIMARY KEY",
];

const TEMP_MARKERS: [&str; 2] = ["USE TEMP B-TREE", "TEMP TABLE"];

const FULL_SCAN_NOTE: &str =
    "Full table scan detected. Consider adding WHERE clauses or using indexed columns.";

impl PlanStep {
    /// Step reads every row of a table without an index.
    pub fn is_full_scan(&self) -> bool {
        let detail = self.detail.trim_start().to_ascii_uppercase();
        detail.starts_with("SCAN ")
            && !detail.starts_with("SCAN CONSTANT ROW")
            && !INDEX_MARKERS.iter().any(|m| detail.contains(m))
    }

    /// Step reaches rows through an index or the primary key.
    ///
    /// Automatic indexes are built per statement and do not count.
    pub fn is_indexed(&self) -> bool {
        let detail = self.detail.to_ascii_uppercase();
        INDEX_MARKERS.iter().any(|m| detail.contains(m))
    }

    pub fn is_covering(&self) -> bool {
        self.detail.to_ascii_uppercase().contains("USING COVERING INDEX")
    }

    /// Step builds a temporary structure (sort or distinct B-tree, temp table).
    pub fn uses_temp(&self) -> bool {
        let detail = self.detail.to_ascii_uppercase();
        TEMP_MARKERS.iter().any(|m| detail.contains(m))
    }

    /// Index used by this step, `PRIMARY KEY` for rowid/primary key lookups.
    pub fn index_name(&self) -> Option<String> {
        let upper = self.detail.to_ascii_uppercase();
        for marker in ["USING COVERING INDEX ", "USING INDEX "] {
            if let Some(pos) = upper.find(marker) {
                let rest = &self.detail[pos + marker.len()..];
                return rest.split_whitespace().next().map(String::from);
            }
        }
        if upper.contains("PRIMARY KEY") && self.is_indexed() {
            return Some("PRIMARY KEY".to_string());
        }
        None
    }
}

/// Derive ordered performance notes from a plan and the query text.
///
/// Always returns at least one note.
pub fn analyze_plan(plan: &[PlanStep], sql: &str) -> Vec<String> {
    let mut notes = Vec::new();

    let full_scans = plan.iter().filter(|s| s.is_full_scan()).count();
    let indexed = plan.iter().any(PlanStep::is_indexed);

    if full_scans > 0 && !indexed {
        notes.push(FULL_SCAN_NOTE.to_string());
    }

    if plan.iter().any(PlanStep::is_covering) {
        notes.push("Query uses covering index efficiently.".to_string());
    } else if indexed {
        let mut names: Vec<String> = Vec::new();
        for name in plan.iter().filter_map(PlanStep::index_name) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        notes.push(format!("Query uses indexed access ({}).", names.join(", ")));
    }

    if plan.iter().any(PlanStep::uses_temp) {
        notes.push("Query creates temporary tables. May be slow on large datasets.".to_string());
    }

    if !indexed && SORT_CLAUSES.is_match(sql) {
        notes.push("Sorting without index. Consider indexing the ORDER BY column.".to_string());
    }

    if full_scans > 1 {
        notes.push(format!(
            "Multiple table scans detected ({}). Ensure proper indexes on join columns.",
            full_scans
        ));
    }

    if notes.is_empty() {
        notes.push("Query plan looks efficient.".to_string());
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(details: &[&str]) -> Vec<PlanStep> {
        details
            .iter()
            .enumerate()
            .map(|(i, d)| PlanStep::new(i as i64 + 2, 0, *d))
            .collect()
    }

    #[test]
    fn test_step_markers() {
        assert!(PlanStep::new(2, 0, "SCAN reviews").is_full_scan());
        assert!(PlanStep::new(2, 0, "SCAN TABLE reviews").is_full_scan());
        assert!(!PlanStep::new(2, 0, "SCAN CONSTANT ROW").is_full_scan());
        assert!(!PlanStep::new(2, 0, "SCAN reviews USING COVERING INDEX idx_store").is_full_scan());
        let search = PlanStep::new(2, 0, "SEARCH reviews USING INDEX idx_store (store_name=?)");
        assert!(!search.is_full_scan());

        let step = PlanStep::new(2, 0, "SEARCH r USING INTEGER PRIMARY KEY (rowid=?)");
        assert!(step.is_indexed());
        assert_eq!(step.index_name().as_deref(), Some("PRIMARY KEY"));

        let step = PlanStep::new(2, 0, "SEARCH reviews USING INDEX idx_store (store_name=?)");
        assert_eq!(step.index_name().as_deref(), Some("idx_store"));

        assert!(PlanStep::new(5, 0, "USE TEMP B-TREE FOR ORDER BY").uses_temp());
    }

    #[test]
    fn test_temp_named_table_is_not_temp_structure() {
        let step = PlanStep::new(2, 0, "SCAN temperatures");
        assert!(!step.uses_temp());

        let notes = analyze_plan(&[step], "SELECT * FROM temperatures");
        assert_eq!(
            notes,
            vec![FULL_SCAN_NOTE]
        );
    }

    #[test]
    fn test_full_scan_without_index() {
        let notes = analyze_plan(&steps(&["SCAN reviews"]), "SELECT * FROM reviews");
        assert_eq!(
            notes,
            vec![FULL_SCAN_NOTE]
        );
    }

    #[test]
    fn test_covering_only_is_positive() {
        let notes = analyze_plan(
            &steps(&["SCAN reviews USING COVERING INDEX idx_store"]),
            "SELECT store_name FROM reviews",
        );
        assert_eq!(notes, vec!["Query uses covering index efficiently."]);
    }

    #[test]
    fn test_indexed_access_names_indexes() {
        let notes = analyze_plan(
            &steps(&[
                "SEARCH reviews USING INDEX idx_store (store_name=?)",
                "SEARCH review_ratings USING INDEX idx_ratings_review (review_id=?)",
            ]),
            "SELECT * FROM reviews JOIN review_ratings ON review_id = reviews.id \
             WHERE store_name = 'x'",
        );
        assert_eq!(notes, vec!["Query uses indexed access (idx_store, idx_ratings_review)."]);
    }

    #[test]
    fn test_automatic_index_is_not_indexed() {
        let plan = steps(&[
            "SCAN reviews",
            "SEARCH review_ratings USING AUTOMATIC COVERING INDEX (review_id=?)",
            "USE TEMP B-TREE FOR GROUP BY",
            "USE TEMP B-TREE FOR ORDER BY",
        ]);
        let notes =
            analyze_plan(&plan, "SELECT ... GROUP BY store_name ORDER BY avg_rating ASC LIMIT 5");
        assert_eq!(
            notes,
            vec![
                "Full table scan detected. Consider adding WHERE clauses or using indexed columns.",
                "Query creates temporary tables. May be slow on large datasets.",
                "Sorting without index. Consider indexing the ORDER BY column.",
            ]
        );
    }

    #[test]
    fn test_order_by_and_multiple_scans() {
        let plan = steps(&["SCAN reviews", "SCAN review_ratings", "USE TEMP B-TREE FOR ORDER BY"]);
        let notes = analyze_plan(&plan, "select * from reviews, review_ratings order  by 1");
        assert_eq!(
            notes,
            vec![
                "Full table scan detected. Consider adding WHERE clauses or using indexed columns.",
                "Query creates temporary tables. May be slow on large datasets.",
                "Sorting without index. Consider indexing the ORDER BY column.",
                "Multiple table scans detected (2). Ensure proper indexes on join columns.",
            ]
        );
    }

    #[test]
    fn test_looks_efficient() {
        assert_eq!(
            analyze_plan(&steps(&["SCAN CONSTANT ROW"]), "SELECT 1"),
            vec!["Query plan looks efficient."]
        );
        assert_eq!(analyze_plan(&[], "SELECT 1"), vec!["Query plan looks efficient."]);
    }
}
