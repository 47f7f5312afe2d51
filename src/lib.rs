//! askdb - guarded natural-language analytics over a read-only store.
//!
//! Pipeline stages:
//! - Policy prefilter on the raw question (no external calls)
//! - LLM translation of the question into a candidate SQL query
//! - Lexical safety validation (read-only, single statement)
//! - Bounded execution against SQLite
//! - Heuristic diagnosis from `EXPLAIN QUERY PLAN` plus timing
//!
//! Can be used as:
//! - Library (`askdb::pipeline::Pipeline`)
//! - CLI (`askdb ask "Which 5 stores have the lowest average rating?"`)

pub mod types;
pub mod config;
pub mod guard;
pub mod llm;
pub mod schema;
pub mod store;
pub mod analyze;
pub mod pipeline;
pub mod otel;
pub mod render;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineRequest, PipelineResponse, TerminalStatus};
pub use types::{AskError, Result};
