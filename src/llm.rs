use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openrouter;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Failures of the upstream generative model or of the payload it returned.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("upstream model call failed: {0}")]
    Upstream(String),
    #[error("upstream model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model returned no usable payload")]
    EmptyPayload,
    #[error("model payload is not a valid object for the declared schema: {0}")]
    Malformed(String),
    #[error("model payload violates the declared schema: {0}")]
    SchemaViolation(String),
}

/// A rendered prompt plus the JSON schema the answer has to conform to.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub flow: &'static str,
    pub prompt: String,
    pub output_schema: Value,
}

/// Seam to the hosted generative model. Returns the raw text of the answer.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;
}

const STRUCTURED_OUTPUT_PREAMBLE: &str = r#"
You are the structured-output backend of a city companion app.
Answer the user's prompt with exactly one JSON object and nothing else: no markdown, no commentary.
Use the exact field names of the JSON Schema below. Leave out optional fields that do not apply.
JSON Schema:
"#;

fn build_preamble(output_schema: &Value) -> String {
    format!("{}{}", STRUCTURED_OUTPUT_PREAMBLE, output_schema)
}

/// OpenRouter-backed model, one rig agent per call.
pub struct OpenRouterModel {
    client: openrouter::Client,
    model: String,
}

impl OpenRouterModel {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config
            .openrouter_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
        Ok(Self::new(api_key, config.llm_model.clone()))
    }
}

#[async_trait]
impl GenerativeModel for OpenRouterModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let preamble = build_preamble(&request.output_schema);
        let agent = self.client.agent(&self.model).preamble(&preamble).build();
        info!("Invoking {} for flow {}", self.model, request.flow);

        let response = agent
            .prompt(request.prompt.clone())
            .await
            .map_err(|e| ModelError::Upstream(e.to_string()))?;

        debug!("Raw model response for {}: {}", request.flow, response);
        Ok(response)
    }
}

/// Bounds every call of the wrapped model by a fixed time limit.
pub struct TimeoutModel<M> {
    inner: M,
    limit: Duration,
}

impl<M: GenerativeModel> TimeoutModel<M> {
    pub fn new(inner: M, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<M: GenerativeModel> GenerativeModel for TimeoutModel<M> {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        tokio::time::timeout(self.limit, self.inner.generate(request))
            .await
            .map_err(|_| {
                warn!("Flow {} timed out after {:?}", request.flow, self.limit);
                ModelError::Timeout(self.limit)
            })?
    }
}

/// Pull the first complete JSON object out of a model answer, tolerating
/// code fences and chatter around it. Braces inside string literals are
/// skipped while matching.
pub fn extract_json_object(raw: &str) -> Result<&str, ModelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyPayload);
    }
    let start = trimmed
        .find('{')
        .ok_or_else(|| ModelError::Malformed("no JSON object in model output".to_string()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in trimmed[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&trimmed[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    Err(ModelError::Malformed(
        "unterminated JSON object in model output".to_string(),
    ))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> ModelRequest {
        ModelRequest {
            flow: "testFlow",
            prompt: "hello".to_string(),
            output_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_extract_json_object_plain() {
        let raw = r#"{"recommendation": "Cubbon Park", "reason": "shade"}"#;
        assert_eq!(extract_json_object(raw).unwrap(), raw);
    }

    #[test]
    fn test_extract_json_object_with_fences_and_chatter() {
        let raw = "Sure! Here you go:\n```json\n{\"matches\": []}\n```\nEnjoy.";
        assert_eq!(extract_json_object(raw).unwrap(), "{\"matches\": []}");
    }

    #[test]
    fn test_extract_json_object_empty() {
        assert!(matches!(
            extract_json_object("   \n"),
            Err(ModelError::EmptyPayload)
        ));
    }

    #[test]
    fn test_extract_json_object_without_object() {
        assert!(matches!(
            extract_json_object("I cannot help with that."),
            Err(ModelError::Malformed(_))
        ));
        assert!(matches!(
            extract_json_object("} oops {"),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_extract_json_object_ignores_trailing_braces() {
        let raw = r#"{"recommendation": "x", "reason": "y"} Note: {not json}"#;
        assert_eq!(
            extract_json_object(raw).unwrap(),
            r#"{"recommendation": "x", "reason": "y"}"#
        );
    }

    #[test]
    fn test_extract_json_object_skips_braces_in_strings() {
        let raw = r#"{"reason": "use } and \" { freely", "nested": {"a": 1}} trailing }"#;
        assert_eq!(
            extract_json_object(raw).unwrap(),
            r#"{"reason": "use } and \" { freely", "nested": {"a": 1}}"#
        );
    }

    #[test]
    fn test_extract_json_object_unterminated() {
        assert!(matches!(
            extract_json_object(r#"{"matches": [{"pgName": "A"}"#),
            Err(ModelError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_model_passes_fast_answers_through() {
        let model = TimeoutModel::new(
            stub::StubModel::answering("{}"),
            Duration::from_secs(5),
        );
        assert_eq!(model.generate(&request()).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_timeout_model_gives_up_on_slow_answers() {
        let model = TimeoutModel::new(
            stub::StubModel::answering("{}").delayed(Duration::from_millis(200)),
            Duration::from_millis(20),
        );
        let err = model.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout(limit) if limit == Duration::from_millis(20)));
    }

    #[test]
    fn test_preamble_embeds_schema() {
        let schema = json!({"type": "object", "required": ["reason"]});
        let preamble = build_preamble(&schema);
        assert!(preamble.contains("exactly one JSON object"));
        assert!(preamble.contains(r#""required":["reason"]"#));
    }
}
