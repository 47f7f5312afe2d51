//! Lexical safety validator for candidate query text.
//!
//! Defense in depth: runs on every query that would reach the store, whether
//! it came from the translator or was supplied raw, and ignores whatever the
//! translator claimed about its own output.
//!
//! The scan is purely lexical. Keywords inside string literals or comments
//! are still treated as keywords, so `WHERE comment LIKE '%update%'` is
//! rejected. This over-rejection is accepted in exchange for not parsing.

use crate::guard::patterns::{BLOCKED_KEYWORDS, READ_ONLY_MARKERS};
use serde::{Deserialize, Serialize};

/// Outcome of safety validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub is_safe: bool,
    pub reason: Option<String>,
}

impl SafetyVerdict {
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            reason: None,
        }
    }

    pub fn unsafe_because(reason: impl Into<String>) -> Self {
        Self {
            is_safe: false,
            reason: Some(reason.into()),
        }
    }
}

/// Decide whether `query_text` may be executed.
///
/// # Algorithm
///
/// 1. Blank text is trivially safe (nothing to execute)
/// 2. Any standalone blocked keyword anywhere -> unsafe, naming the keyword
/// 3. A `;` followed by more text -> unsafe (single statement only)
/// 4. Text must open with `SELECT` or `WITH`
///
/// Matching is case-insensitive; `query_text` itself is never modified.
pub fn validate_query(query_text: &str) -> SafetyVerdict {
    if query_text.trim().is_empty() {
        return SafetyVerdict::safe();
    }

    let upper = query_text.trim().to_uppercase();

    if let Some(hit) = BLOCKED_KEYWORDS.first_match(&upper) {
        return SafetyVerdict::unsafe_because(format!(
            "Blocked: {} statements are not allowed",
            hit.term
        ));
    }

    if has_trailing_statement(&upper) {
        return SafetyVerdict::unsafe_because("Blocked: multiple statements are not allowed");
    }

    if !READ_ONLY_MARKERS.is_match(&upper) {
        return SafetyVerdict::unsafe_because("Query must be a SELECT statement");
    }

    SafetyVerdict::safe()
}

/// `true` when a statement separator is followed by anything but whitespace.
fn has_trailing_statement(text: &str) -> bool {
    text.find(';')
        .map(|pos| text[pos + 1..].chars().any(|c| !c.is_whitespace() && c != ';'))
        .unwrap_or(false)
}
