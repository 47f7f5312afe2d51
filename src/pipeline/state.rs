//! Request lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-terminal states a request passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Received,
    PolicyChecked,
    Translated,
    Validated,
    Executed,
    Diagnosed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::PolicyChecked => "policy_checked",
            Self::Translated => "translated",
            Self::Validated => "validated",
            Self::Executed => "executed",
            Self::Diagnosed => "diagnosed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a request ended. Every request ends in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    /// Prefilter matched, or the translator refused the question
    Blocked,
    TranslationFailed,
    /// Candidate query failed safety validation
    Rejected,
    /// Execution failed (timeout, operational or unknown error)
    Failed,
    Succeeded,
}

impl TerminalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "Blocked",
            Self::TranslationFailed => "TranslationFailed",
            Self::Rejected => "Rejected",
            Self::Failed => "Failed",
            Self::Succeeded => "Succeeded",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(PipelineState::PolicyChecked.to_string(), "policy_checked");
        assert_eq!(TerminalStatus::TranslationFailed.to_string(), "TranslationFailed");
        assert!(TerminalStatus::Succeeded.is_success());
        assert!(!TerminalStatus::Rejected.is_success());
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&TerminalStatus::Blocked).unwrap();
        assert_eq!(json, "\"Blocked\"");
    }
}
