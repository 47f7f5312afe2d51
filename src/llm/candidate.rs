//! Candidate queries proposed by the translator.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Token accounting reported by the LLM provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Prompt/input tokens
    pub prompt_units: u32,

    /// Completion/output tokens
    pub completion_units: u32,

    /// Total tokens
    pub total_units: u32,
}

impl UsageMetadata {
    pub fn new(prompt_units: u32, completion_units: u32) -> Self {
        Self {
            prompt_units,
            completion_units,
            total_units: prompt_units + completion_units,
        }
    }
}

/// Translator output: a proposed query plus metadata. Untrusted.
///
/// When `is_blocked` is set, `query_text` is unusable regardless of content.
/// When `is_ambiguous` is set, `query_text` still carries a best-effort query
/// and `clarification` explains what was unclear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateQuery {
    /// Restatement of what the user asked
    #[serde(default)]
    pub understood_question: String,

    /// Whether the question needs clarification
    #[serde(default)]
    pub is_ambiguous: bool,

    /// What clarification is needed, empty if not ambiguous
    #[serde(default)]
    pub clarification: String,

    /// Proposed SQL
    #[serde(default)]
    pub query_text: String,

    /// Plain English explanation of the query
    #[serde(default)]
    pub explanation: String,

    /// Column names the query is expected to return
    #[serde(default)]
    pub expected_columns: Vec<String>,

    /// Whether the translator refused the question
    #[serde(default)]
    pub is_blocked: bool,

    /// Why it refused, empty if not blocked
    #[serde(default)]
    pub block_reason: String,

    /// Provider token usage (filled from the response envelope)
    #[serde(default, skip_deserializing)]
    pub usage: UsageMetadata,
}

impl CandidateQuery {
    /// Candidate for a raw query supplied directly by the caller.
    pub fn raw(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Self::default()
        }
    }

    /// Clarification text, only when the candidate is ambiguous and says something.
    pub fn clarification_text(&self) -> Option<&str> {
        if self.is_ambiguous && !self.clarification.trim().is_empty() {
            Some(self.clarification.as_str())
        } else {
            None
        }
    }

    /// Blocked reason with a fallback when the translator left it empty.
    pub fn blocked_reason(&self) -> String {
        if self.block_reason.trim().is_empty() {
            "Question was blocked by guardrails".to_string()
        } else {
            self.block_reason.clone()
        }
    }

    /// JSON Schema every translator reply must satisfy.
    pub fn json_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "understood_question": {"type": "string"},
                "is_ambiguous": {"type": "boolean"},
                "clarification": {"type": "string"},
                "query_text": {"type": "string"},
                "explanation": {"type": "string"},
                "expected_columns": {"type": "array", "items": {"type": "string"}},
                "is_blocked": {"type": "boolean"},
                "block_reason": {"type": "string"}
            },
            "required": [
                "understood_question", "is_ambiguous", "clarification", "query_text",
                "explanation", "expected_columns", "is_blocked", "block_reason"
            ],
            "additionalProperties": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_reply() {
        let body = r#"{
            "understood_question": "Bottom 5 stores by rating",
            "is_ambiguous": false,
            "clarification": "",
            "query_text": "SELECT 1",
            "explanation": "Selects one",
            "expected_columns": ["a"],
            "is_blocked": false,
            "block_reason": ""
        }"#;
        let candidate: CandidateQuery = serde_json::from_str(body).unwrap();
        assert_eq!(candidate.query_text, "SELECT 1");
        assert_eq!(candidate.explanation, "Selects one");
        assert_eq!(candidate.expected_columns, vec!["a"]);
        assert_eq!(candidate.usage, UsageMetadata::default());
    }

    #[test]
    fn test_clarification_only_when_ambiguous() {
        let mut candidate = CandidateQuery {
            clarification: "Which period?".into(),
            ..Default::default()
        };
        assert_eq!(candidate.clarification_text(), None);

        candidate.is_ambiguous = true;
        assert_eq!(candidate.clarification_text(), Some("Which period?"));
    }

    #[test]
    fn test_block_reason_fallback() {
        let candidate = CandidateQuery {
            is_blocked: true,
            ..Default::default()
        };
        assert_eq!(candidate.blocked_reason(), "Question was blocked by guardrails");
    }

    #[test]
    fn test_usage_total() {
        let usage = UsageMetadata::new(120, 30);
        assert_eq!(usage.total_units, 150);
    }
}
