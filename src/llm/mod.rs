//! LLM-powered natural language to SQL translation.

pub mod candidate;
pub mod translator;

pub use candidate::{CandidateQuery, UsageMetadata};
pub use translator::{LlmProvider, LlmTranslator, QueryTranslator};
