//! Error types for askdb operations.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use crate::pipeline::TerminalStatus;
use crate::store::ExecErrorKind;
use thiserror::Error;

/// Error type for every stage of the ask pipeline.
///
/// The first seven variants are the pipeline taxonomy; each one maps to exactly
/// one terminal status. The remaining variants cover configuration and I/O.
#[derive(Error, Debug)]
pub enum AskError {
    /// Question mentions a disallowed topic
    #[error("Question mentions a blocked topic: {0}")]
    PolicyBlocked(String),

    /// External translator call failed
    #[error("Query translation failed: {0}")]
    TranslationFailed(String),

    /// Translator flagged its own candidate as blocked
    #[error("Request blocked by translator: {0}")]
    CandidateBlocked(String),

    /// Candidate query failed the safety validator
    #[error("Unsafe query: {0}")]
    UnsafeQuery(String),

    /// Execution exceeded its timeout (milliseconds)
    #[error("Query timed out after {0} ms")]
    ExecutionTimeout(u64),

    /// Store reported an operational failure (syntax, missing table, busy)
    #[error("Query execution failed: {0}")]
    ExecutionOperationalError(String),

    /// Any other execution failure
    #[error("Query execution failed unexpectedly: {0}")]
    ExecutionUnknownError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Schema description could not be produced
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for askdb operations.
pub type Result<T> = std::result::Result<T, AskError>;

impl AskError {
    /// Create a translation error with context.
    pub fn translation(msg: impl Into<String>) -> Self {
        Self::TranslationFailed(msg.into())
    }

    /// Create a configuration error with context.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Execution error classification, if this is an execution failure.
    pub fn exec_kind(&self) -> Option<ExecErrorKind> {
        match self {
            Self::ExecutionTimeout(_) => Some(ExecErrorKind::Timeout),
            Self::ExecutionOperationalError(_) => Some(ExecErrorKind::OperationalError),
            Self::ExecutionUnknownError(_) => Some(ExecErrorKind::UnknownError),
            _ => None,
        }
    }

    /// Terminal pipeline status this error ends a request with.
    ///
    /// Ambient errors (config, I/O) can only surface around execution, so they
    /// terminate as `Failed`.
    pub fn terminal_status(&self) -> TerminalStatus {
        match self {
            Self::PolicyBlocked(_) | Self::CandidateBlocked(_) => TerminalStatus::Blocked,
            Self::TranslationFailed(_) => TerminalStatus::TranslationFailed,
            Self::UnsafeQuery(_) => TerminalStatus::Rejected,
            _ => TerminalStatus::Failed,
        }
    }
}
