//! Policy prefilter on raw questions.
//!
//! Runs before the translator so a disallowed topic never costs an LLM call
//! and cannot be waved through by translator behavior.

use crate::guard::patterns::COMPETITORS;
use serde::{Deserialize, Serialize};

/// Outcome of the policy prefilter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub blocked: bool,
    /// Declared term that matched (list spelling, not input spelling)
    pub matched_term: Option<String>,
}

impl PolicyVerdict {
    pub fn clear() -> Self {
        Self {
            blocked: false,
            matched_term: None,
        }
    }

    /// Human-readable reason for a blocked verdict.
    pub fn reason(&self) -> Option<String> {
        self.matched_term.as_ref().map(|term| {
            format!(
                "Cannot process questions about competitor brands ({})",
                title_case(term)
            )
        })
    }
}

/// Scan a question for disallowed topics.
///
/// Case-insensitive exact substring match against the competitor table; the
/// first declared term that occurs anywhere in the question is reported.
///
/// # Examples
///
/// ```
/// use askdb::guard::check_question;
///
/// let verdict = check_question("How does BrandX compare to KFC?");
/// assert!(verdict.blocked);
/// assert_eq!(verdict.matched_term.as_deref(), Some("kfc"));
/// ```
pub fn check_question(question: &str) -> PolicyVerdict {
    match COMPETITORS.first_match(question) {
        Some(hit) => PolicyVerdict {
            blocked: true,
            matched_term: Some(hit.term.to_string()),
        },
        None => PolicyVerdict::clear(),
    }
}

fn title_case(term: &str) -> String {
    term.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
