//! Natural language to SQL translator.
//!
//! The translator is an untrusted collaborator: its output is checked against
//! the candidate JSON schema here, and for safety later by the validator.
//! Every failure (transport, HTTP status, decoding, schema) collapses into
//! `AskError::TranslationFailed`. Nothing is retried.

use crate::config::Config;
use crate::guard::patterns::{BLOCKED_KEYWORDS, COMPETITORS};
use crate::llm::candidate::{CandidateQuery, UsageMetadata};
use crate::types::{AskError, Result};
use async_trait::async_trait;
use jsonschema::JSONSchema;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Boundary to the external natural-language-to-SQL service.
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    /// Translate a question into a candidate query.
    ///
    /// # Arguments
    ///
    /// * `question` - Natural language question
    /// * `schema_description` - Store schema the query must target
    ///
    /// # Errors
    ///
    /// Returns `AskError::TranslationFailed` on any service failure
    async fn translate(&self, question: &str, schema_description: &str) -> Result<CandidateQuery>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Infer provider from model name.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("claude") || model.starts_with("anthropic") {
            Self::Anthropic
        } else {
            Self::OpenAI
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// OpenAI chat completion envelope.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Anthropic messages envelope.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// HTTP translator backed by OpenAI or Anthropic.
pub struct LlmTranslator {
    api_key: String,
    model: String,
    provider: LlmProvider,
    client: Client,
}

impl LlmTranslator {
    /// Create new translator.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for the provider implied by `model`
    /// * `model` - Model name (e.g., "gpt-4o-mini", "claude-3-5-haiku-latest")
    /// * `timeout` - Per-request HTTP timeout
    ///
    /// # Errors
    ///
    /// Returns `AskError::ConfigError` if the HTTP client cannot be built
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AskError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            provider: LlmProvider::for_model(&model),
            api_key,
            model,
            client,
        })
    }

    /// Create from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AskError::ConfigError` if no API key is configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = LlmProvider::for_model(&config.llm_model);
        let api_key = config.api_key.clone().ok_or_else(|| {
            AskError::config(format!("{} environment variable not set", provider.api_key_env()))
        })?;

        Self::new(
            api_key,
            config.llm_model.clone(),
            Duration::from_secs(config.translator_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Call OpenAI with a strict JSON schema response format.
    async fn call_openai(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<(String, UsageMetadata)> {
        let response = self.client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {
                        "name": "sql_query_response",
                        "strict": true,
                        "schema": CandidateQuery::json_schema()
                    }
                },
                "temperature": 0.1
            }))
            .send()
            .await
            .map_err(|e| AskError::translation(format!("OpenAI API error: {}", e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| AskError::translation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::translation(format!("OpenAI API error {}: {}", status, body)));
        }

        parse_openai_envelope(&body)
    }

    /// Call Anthropic; the schema is conveyed in the prompt.
    async fn call_anthropic(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<(String, UsageMetadata)> {
        let system = format!(
            "{}\n\nRespond with a single JSON object matching this JSON Schema, no markdown:\n{}",
            system_prompt,
            CandidateQuery::json_schema()
        );

        let response = self.client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "max_tokens": 2048,
                "system": system,
                "messages": [
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": 0.1
            }))
            .send()
            .await
            .map_err(|e| AskError::translation(format!("Anthropic API error: {}", e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| AskError::translation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::translation(format!("Anthropic API error {}: {}", status, body)));
        }

        parse_anthropic_envelope(&body)
    }
}

#[async_trait]
impl QueryTranslator for LlmTranslator {
    async fn translate(&self, question: &str, schema_description: &str) -> Result<CandidateQuery> {
        let system_prompt = system_prompt();
        let user_prompt = user_prompt(question, schema_description);

        let (content, usage) = match self.provider {
            LlmProvider::OpenAI => self.call_openai(&system_prompt, &user_prompt).await?,
            LlmProvider::Anthropic => self.call_anthropic(&system_prompt, &user_prompt).await?,
        };

        tracing::debug!(model = %self.model, "translator reply: {}", content);

        let mut candidate = parse_candidate(&content)?;
        candidate.usage = usage;
        Ok(candidate)
    }
}

/// Extract message content and usage from an OpenAI response body.
fn parse_openai_envelope(body: &str) -> Result<(String, UsageMetadata)> {
    let parsed: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| AskError::translation(format!("Failed to parse OpenAI response: {}", e)))?;

    let content = parsed.choices.into_iter().next()
        .ok_or_else(|| AskError::translation("No response from OpenAI"))?
        .message.content;

    let usage = parsed.usage
        .map(|u| UsageMetadata {
            prompt_units: u.prompt_tokens,
            completion_units: u.completion_tokens,
            total_units: u.total_tokens,
        })
        .unwrap_or_default();

    Ok((content, usage))
}

/// Extract text content and usage from an Anthropic response body.
fn parse_anthropic_envelope(body: &str) -> Result<(String, UsageMetadata)> {
    let parsed: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| AskError::translation(format!("Failed to parse Anthropic response: {}", e)))?;

    let text = parsed.content.into_iter().next()
        .ok_or_else(|| AskError::translation("No response from Anthropic"))?
        .text;

    let usage = parsed.usage
        .map(|u| UsageMetadata::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    Ok((strip_markdown(&text), usage))
}

/// Validate a reply against the candidate schema and decode it.
pub fn parse_candidate(content: &str) -> Result<CandidateQuery> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| AskError::translation(format!("Reply is not valid JSON: {}", e)))?;

    let schema = CandidateQuery::json_schema();
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| AskError::translation(format!("Invalid candidate schema: {}", e)))?;

    if let Err(errors) = compiled.validate(&value) {
        let details: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(AskError::translation(format!(
            "Reply does not match candidate schema: {}",
            details.join("; ")
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| AskError::translation(format!("Failed to decode candidate: {}", e)))
}

/// Strip markdown code fences from an LLM reply.
///
/// Handles:
/// - ```json ... ```
/// - ``` ... ```
fn strip_markdown(text: &str) -> String {
    let text = text.trim();

    if text.starts_with("```") {
        let start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
        let end = text.rfind("```").filter(|&end| end >= start).unwrap_or(text.len());
        return text[start..end].trim().to_string();
    }

    text.to_string()
}

/// System prompt: SQL rules, guardrails and ambiguity handling.
fn system_prompt() -> String {
    let competitors: Vec<&str> = COMPETITORS.terms().collect();
    let keywords: Vec<&str> = BLOCKED_KEYWORDS.terms().collect();

    format!(
        r#"You translate analytics questions about restaurant reviews into SQLite queries.

RULES:
1. Produce exactly one read-only statement starting with SELECT or WITH.
2. Never use these keywords: {keywords}.
3. Use table aliases and explicit JOINs for related tables.
4. Join review_categories for sentiment or category questions, review_ratings for
   per-field ratings, review_extras for extra fields such as waitron or meal.
5. Use COUNT/AVG/SUM for summaries and ORDER BY with LIMIT for top/bottom questions.
6. Use SQLite date functions for time filters and add WHERE clauses where possible.

GUARDRAILS (set is_blocked=true with a block_reason and an empty query_text):
- Any mention of a competitor brand ({competitors}).
- Comparisons between our brand and any other brand.
- Requests for confidential data not present in the schema.
- Any request to modify data or structure.

AMBIGUITY:
If the question has several reasonable readings, set is_ambiguous=true, say what
needs clarifying in clarification, and STILL provide the best-guess query_text.

List the result column names in expected_columns and explain the query in plain
English in explanation. Restate the question in understood_question."#,
        keywords = keywords.join(", "),
        competitors = competitors.join(", "),
    )
}

fn user_prompt(question: &str, schema_description: &str) -> String {
    format!(
        "{}\n\nUSER QUESTION: {}\n\n\
         Generate a SQL query that answers this question. Follow all rules and guardrails.",
        schema_description, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(query_text: &str) -> String {
        json!({
            "understood_question": "Lowest rated stores",
            "is_ambiguous": false,
            "clarification": "",
            "query_text": query_text,
            "explanation": "Averages ratings per store",
            "expected_columns": ["store_name", "avg_rating"],
            "is_blocked": false,
            "block_reason": ""
        })
        .to_string()
    }

    #[test]
    fn test_provider_for_model() {
        assert_eq!(LlmProvider::for_model("gpt-4o-mini"), LlmProvider::OpenAI);
        assert_eq!(LlmProvider::for_model("claude-3-5-haiku-latest"), LlmProvider::Anthropic);
        assert_eq!(LlmProvider::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_strip_markdown() {
        assert_eq!(strip_markdown("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_markdown("```\n{}\n```"), "{}");
        assert_eq!(strip_markdown("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_markdown("```"), "");
    }

    #[test]
    fn test_parse_candidate_valid() {
        let candidate = parse_candidate(&reply("SELECT 1")).unwrap();
        assert_eq!(candidate.query_text, "SELECT 1");
        assert_eq!(candidate.expected_columns.len(), 2);
    }

    #[test]
    fn test_parse_candidate_rejects_schema_violation() {
        let err = parse_candidate(r#"{"query_text": "SELECT 1"}"#).unwrap_err();
        assert!(matches!(err, AskError::TranslationFailed(_)));
        assert!(err.to_string().contains("does not match candidate schema"));

        let err = parse_candidate("not json").unwrap_err();
        assert!(matches!(err, AskError::TranslationFailed(_)));
    }

    #[test]
    fn test_parse_openai_envelope() {
        let body = json!({
            "choices": [{"message": {"content": reply("SELECT 2")}}],
            "usage": {"prompt_tokens": 900, "completion_tokens": 80, "total_tokens": 980}
        })
        .to_string();

        let (content, usage) = parse_openai_envelope(&body).unwrap();
        assert!(content.contains("SELECT 2"));
        assert_eq!(
            usage,
            UsageMetadata {
                prompt_units: 900,
                completion_units: 80,
                total_units: 980
            }
        );

        let err = parse_openai_envelope(r#"{"choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("No response from OpenAI"));
    }

    #[test]
    fn test_parse_anthropic_envelope() {
        let body = json!({
            "content": [{"text": format!("```json\n{}\n```", reply("SELECT 3"))}],
            "usage": {"input_tokens": 50, "output_tokens": 25}
        })
        .to_string();

        let (content, usage) = parse_anthropic_envelope(&body).unwrap();
        assert_eq!(parse_candidate(&content).unwrap().query_text, "SELECT 3");
        assert_eq!(usage.total_units, 75);
    }

    #[test]
    fn test_prompts_carry_guard_tables_and_schema() {
        let system = system_prompt();
        assert!(system.contains("kfc"));
        assert!(system.contains("DELETE"));

        let user = user_prompt("Top stores?", "Table: reviews");
        assert!(user.starts_with("Table: reviews"));
        assert!(user.contains("USER QUESTION: Top stores?"));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config {
            api_key: None,
            ..Config::default()
        };
        let err = LlmTranslator::from_config(&config).err().unwrap();
        assert!(matches!(err, AskError::ConfigError(_)));
    }
}
