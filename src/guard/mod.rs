//! Guardrails applied before anything reaches the store.
//!
//! - `patterns`: declarative `{category, matcher}` tables, built once
//! - `prefilter`: disallowed-topic check on the raw question
//! - `validator`: lexical read-only / single-statement check on query text

pub mod patterns;
pub mod prefilter;
pub mod validator;

pub use patterns::{Category, Matcher, PatternMatch, PatternTable};
pub use prefilter::{check_question, PolicyVerdict};
pub use validator::{validate_query, SafetyVerdict};
