//! Schema descriptions handed to the translator.
//!
//! Sources:
//! - `schema_file` from [`Config`], when set
//! - the built-in review analytics description otherwise
//! - live introspection through [`QueryStore::describe_schema`] (CLI only)

pub mod builtin;

use crate::config::Config;
use crate::store::QueryStore;
use crate::types::{AskError, Result};
use std::fmt;

pub use builtin::REVIEWS_SCHEMA;

/// Where a schema description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    Builtin,
    File,
    Introspected,
}

/// Schema description text plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescription {
    pub text: String,
    pub source: SchemaSource,
}

impl SchemaDescription {
    pub fn builtin() -> Self {
        Self {
            text: REVIEWS_SCHEMA.to_string(),
            source: SchemaSource::Builtin,
        }
    }

    /// Pick the description configured for translation.
    ///
    /// # Errors
    ///
    /// Returns `AskError::SchemaError` if the configured file cannot be read
    /// or is empty
    pub fn resolve(config: &Config) -> Result<Self> {
        let Some(path) = &config.schema_file else {
            return Ok(Self::builtin());
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| AskError::SchemaError(format!("{}: {}", path.display(), e)))?;
        if text.trim().is_empty() {
            return Err(AskError::SchemaError(format!("{}: schema file is empty", path.display())));
        }

        Ok(Self {
            text,
            source: SchemaSource::File,
        })
    }

    /// Describe the live database.
    pub async fn introspect(store: &dyn QueryStore) -> Result<Self> {
        Ok(Self {
            text: store.describe_schema().await?,
            source: SchemaSource::Introspected,
        })
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
