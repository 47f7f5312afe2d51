//! Runtime configuration.
//!
//! Sources, in order of use:
//! - `Config::from_env()` - `ASKDB_*` environment variables
//! - `Config::load(path)` - JSON or YAML file (API key still taken from env)

use crate::llm::LlmProvider;
use crate::types::{AskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default execution timeout (large read-only datasets).
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 120;

/// Default bound for the explain-plan call.
pub const DEFAULT_EXPLAIN_TIMEOUT_MS: u64 = 5_000;

/// Default HTTP timeout for the translator.
pub const DEFAULT_TRANSLATOR_TIMEOUT_SECS: u64 = 60;

/// Upper bound accepted for any timeout (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Default LLM model.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// askdb configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file (opened read-only)
    pub db_path: PathBuf,

    /// LLM model name; the provider is inferred from it
    pub llm_model: String,

    /// Provider API key (never written back out)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Query execution timeout
    pub query_timeout_secs: u64,

    /// Explain-plan timeout
    pub explain_timeout_ms: u64,

    /// Translator HTTP timeout
    pub translator_timeout_secs: u64,

    /// Text file replacing the built-in schema description
    pub schema_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("reviews.db"),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            explain_timeout_ms: DEFAULT_EXPLAIN_TIMEOUT_MS,
            translator_timeout_secs: DEFAULT_TRANSLATOR_TIMEOUT_SECS,
            schema_file: None,
        }
    }
}

impl Config {
    /// Build configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `ASKDB_DB_PATH` | `db_path` |
    /// | `ASKDB_LLM` | `llm_model` |
    /// | `ASKDB_QUERY_TIMEOUT_SECS` | `query_timeout_secs` |
    /// | `ASKDB_EXPLAIN_TIMEOUT_MS` | `explain_timeout_ms` |
    /// | `ASKDB_TRANSLATOR_TIMEOUT_SECS` | `translator_timeout_secs` |
    /// | `ASKDB_SCHEMA_FILE` | `schema_file` |
    /// | `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` | `api_key` (by model) |
    ///
    /// # Errors
    ///
    /// Returns `AskError::ConfigError` for unparsable or zero timeouts
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = get("ASKDB_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(model) = get("ASKDB_LLM") {
            config.llm_model = model;
        }
        if let Some(value) = get("ASKDB_QUERY_TIMEOUT_SECS") {
            config.query_timeout_secs = parse_u64("ASKDB_QUERY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("ASKDB_EXPLAIN_TIMEOUT_MS") {
            config.explain_timeout_ms = parse_u64("ASKDB_EXPLAIN_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = get("ASKDB_TRANSLATOR_TIMEOUT_SECS") {
            config.translator_timeout_secs = parse_u64("ASKDB_TRANSLATOR_TIMEOUT_SECS", &value)?;
        }
        if let Some(path) = get("ASKDB_SCHEMA_FILE") {
            config.schema_file = Some(PathBuf::from(path));
        }

        config.apply_api_key(&get);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON or YAML file.
    ///
    /// The format is chosen by extension (`.yaml`/`.yml` is YAML, anything else
    /// JSON). An API key in the environment overrides one in the file.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Io` if the file cannot be read, `AskError::Json` /
    /// `AskError::Yaml` if it cannot be parsed, `AskError::ConfigError` if a
    /// value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let mut config: Config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        config.apply_api_key(&|key: &str| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_api_key<F>(&mut self, get: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = LlmProvider::for_model(&self.llm_model);
        if let Some(key) = get(provider.api_key_env()).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.query_timeout_secs == 0 {
            return Err(AskError::config("query_timeout_secs must be greater than zero"));
        }
        if self.explain_timeout_ms == 0 {
            return Err(AskError::config("explain_timeout_ms must be greater than zero"));
        }
        if self.translator_timeout_secs == 0 {
            return Err(AskError::config("translator_timeout_secs must be greater than zero"));
        }
        if self.query_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AskError::config(format!(
                "query_timeout_secs must be at most {}",
                MAX_TIMEOUT_SECS
            )));
        }
        if self.explain_timeout_ms > MAX_TIMEOUT_SECS * 1_000 {
            return Err(AskError::config(format!(
                "explain_timeout_ms must be at most {}",
                MAX_TIMEOUT_SECS * 1_000
            )));
        }
        if self.translator_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AskError::config(format!(
                "translator_timeout_secs must be at most {}",
                MAX_TIMEOUT_SECS
            )));
        }
        if self.llm_model.trim().is_empty() {
            return Err(AskError::config("llm_model must not be empty"));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn explain_timeout(&self) -> Duration {
        Duration::from_millis(self.explain_timeout_ms)
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            AskError::config(format!("{} must be a non-negative integer, got '{}'", name, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("reviews.db"));
        assert_eq!(config.query_timeout(), Duration::from_secs(120));
        assert_eq!(config.explain_timeout(), Duration::from_millis(5000));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_env_overrides_and_provider_key() {
        let config = Config::from_vars(vars(&[
            ("ASKDB_DB_PATH", "/data/reviews.db"),
            ("ASKDB_LLM", "claude-3-5-haiku-latest"),
            ("ASKDB_QUERY_TIMEOUT_SECS", "30"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/reviews.db"));
        assert_eq!(config.query_timeout_secs, 30);
        assert_eq!(config.api_key.as_deref(), Some("sk-ant"));
    }

    #[test]
    fn test_invalid_timeouts_rejected() {
        let err = Config::from_vars(vars(&[("ASKDB_QUERY_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AskError::ConfigError(_)));

        let err = Config::from_vars(vars(&[("ASKDB_EXPLAIN_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(err.to_string().contains("explain_timeout_ms"));
    }

    #[test]
    fn test_oversized_timeouts_rejected() {
        let err = Config::from_vars(vars(&[("ASKDB_QUERY_TIMEOUT_SECS", "99999999")])).unwrap_err();
        assert!(err.to_string().contains("query_timeout_secs must be at most 86400"));

        let config = Config {
            explain_timeout_ms: MAX_TIMEOUT_SECS * 1_000 + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            query_timeout_secs: MAX_TIMEOUT_SECS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "db_path: /tmp/r.db\nquery_timeout_secs: 10").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/r.db"));
        assert_eq!(config.query_timeout_secs, 10);
        assert_eq!(config.explain_timeout_ms, DEFAULT_EXPLAIN_TIMEOUT_MS);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"llm_model": "gpt-4o", "explain_timeout_ms": 250}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.explain_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = Config {
            api_key: Some("secret".into()),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
