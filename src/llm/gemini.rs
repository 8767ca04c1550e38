//! Gemini API client implementation
//!
//! Implements both inference capabilities (step analysis and verdict
//! synthesis) against the Gemini generateContent API. The two capabilities
//! share the HTTP client and backoff state but no per-run state: context is
//! passed in on every call.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde_json::{Value, json};

use crate::context::Context;
use crate::domain::{StepResult, Target, Verdict};
use crate::error::{ArgusError, Result};
use crate::llm::backoff::BackoffState;
use crate::llm::client::{StepAnalyst, Synthesizer};
use crate::llm::schema;

/// Gemini API base URL
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model to use
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default max output tokens
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub endpoint: String,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: GEMINI_API_URL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    /// Create a config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: GeminiConfig,
    backoff: Mutex<BackoffState>,
}

impl GeminiClient {
    /// Create a client with an explicit API key.
    ///
    /// Credentials always arrive through configuration; the core never reads
    /// process environment.
    pub fn new(api_key: String, config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArgusError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
            backoff: Mutex::new(BackoffState::new()),
        })
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the request body for a step-analysis call: the capture as inline
    /// image data plus the rendered prompt.
    fn build_step_request(&self, image: &[u8], context: &Context, target: &Target) -> Value {
        let prompt = step_prompt(&target.country, context);
        json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": "image/jpeg",
                            "data": BASE64.encode(image)
                        }
                    },
                    { "text": prompt }
                ]
            }],
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens
            }
        })
    }

    /// Build the request body for a synthesis call: text only.
    fn build_synthesis_request(&self, steps: &[StepResult]) -> Value {
        let prompt = synthesis_prompt(steps);
        json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens
            }
        })
    }

    /// Pull the reply text out of a generateContent response.
    fn response_text(body: &Value) -> Result<String> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                ArgusError::MalformedResponse("response has no candidate content".to_string())
            })?;

        let mut text = String::new();
        for part in parts {
            if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(t);
            }
        }

        if text.is_empty() {
            return Err(ArgusError::MalformedResponse(
                "response contained no text parts".to_string(),
            ));
        }
        Ok(text)
    }

    /// Send a request, honoring any active global backoff.
    async fn send_request(&self, body: Value) -> Result<Value> {
        let hold = self.backoff.lock().unwrap().remaining();
        if let Some(hold) = hold {
            tokio::time::sleep(hold).await;
        }

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ArgusError::Transient(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);
            self.backoff
                .lock()
                .unwrap()
                .record_rate_limit(Duration::from_secs(retry_after));
            return Err(ArgusError::Transient(format!(
                "Rate limited, retry after {} seconds",
                retry_after
            )));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ArgusError::Transient(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        self.backoff.lock().unwrap().record_success();

        response
            .json()
            .await
            .map_err(|e| ArgusError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl StepAnalyst for GeminiClient {
    async fn analyze(&self, image: &[u8], context: &Context, target: &Target) -> Result<StepResult> {
        let body = self.build_step_request(image, context, target);
        let response = self.send_request(body).await?;
        let text = Self::response_text(&response)?;
        schema::parse_step(&text)
    }
}

#[async_trait]
impl Synthesizer for GeminiClient {
    async fn synthesize(&self, steps: &[StepResult]) -> Result<Verdict> {
        let body = self.build_synthesis_request(steps);
        let response = self.send_request(body).await?;
        let text = Self::response_text(&response)?;
        schema::parse_verdict(&text)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

/// Prompt for one step of image analysis.
fn step_prompt(country: &str, context: &Context) -> String {
    let mut prompt = format!(
        "You are a senior intelligence analyst interpreting satellite imagery. \
Intelligence indicates this area is a significant military facility of {}. \
Analyze the provided satellite image and respond ONLY with a JSON object \
containing these keys:\n\
 - 'findings': list of identifiable man-made structures, military equipment and \
critical infrastructure\n\
 - 'analysis': concise tactical analysis of the findings\n\
 - 'follow_ups': list of features requiring further scrutiny in subsequent imagery\n\
 - 'action': exactly one of ['zoom-in','zoom-out','move-left','move-right','finish'], \
chosen to best improve your understanding of the target area\n",
        country
    );

    if !context.is_empty() {
        prompt.push_str(&format!(
            "\nReports from analysts who examined earlier imagery of this target:\n{}\n",
            context.render()
        ));
    }

    prompt
}

/// Prompt for the final synthesis over all step analyses.
fn synthesis_prompt(steps: &[StepResult]) -> String {
    let mut history = String::new();
    for (i, step) in steps.iter().enumerate() {
        history.push_str(&format!(
            "Analyst {}:\n - {}\n",
            i + 1,
            step.analysis
        ));
    }

    format!(
        "You are the commander of a team of imagery analysts investigating a \
suspected military installation. Each report below was written by a different \
analyst examining successive captures of the same target.\n\n{}\n\
Return a final ruling as a JSON object with these keys:\n\
 - 'overall_assessment': your synthesized judgment\n\
 - 'key_confirmed_assets': assets corroborated by two or more analysts\n\
 - 'unresolved_items': claims stated once or contradicted by another analyst\n\
 - 'recommended_actions': ordered follow-up actions\n\
 - 'confidence_score': 'High' only with broad corroboration and no contradictions, \
'Medium' for partial corroboration, 'Low' otherwise\n",
        history
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key".to_string(), GeminiConfig::default()).unwrap()
    }

    fn step(analysis: &str) -> StepResult {
        StepResult {
            findings: vec![],
            analysis: analysis.to_string(),
            follow_ups: vec![],
            action: Action::Finish,
            raw_response: String::new(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_output_tokens, DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_with_model() {
        let config = GeminiConfig::with_model("gemini-1.5-pro");
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.endpoint, GEMINI_API_URL);
    }

    #[test]
    fn test_build_step_request_embeds_image_and_prompt() {
        let client = client();
        let target = Target::new(10.0, 20.0, "X");
        let body = client.build_step_request(&[1, 2, 3], &Context::default(), &target);

        let parts = body.pointer("/contents/0/parts").unwrap().as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0]["inline_data"]["data"].as_str().unwrap(),
            BASE64.encode([1, 2, 3])
        );
        assert!(parts[1]["text"].as_str().unwrap().contains("facility of X"));
        assert_eq!(
            body["generationConfig"]["maxOutputTokens"],
            DEFAULT_MAX_OUTPUT_TOKENS
        );
    }

    #[test]
    fn test_step_prompt_includes_context_when_present() {
        let context = Context::default().extend(&step("saw a runway"));
        let prompt = step_prompt("X", &context);
        assert!(prompt.contains("saw a runway"));
        assert!(prompt.contains("earlier imagery"));
    }

    #[test]
    fn test_step_prompt_omits_context_section_when_empty() {
        let prompt = step_prompt("X", &Context::default());
        assert!(!prompt.contains("earlier imagery"));
    }

    #[test]
    fn test_synthesis_prompt_numbers_analysts_in_order() {
        let steps = vec![step("first report"), step("second report")];
        let prompt = synthesis_prompt(&steps);
        let first = prompt.find("Analyst 1:").unwrap();
        let second = prompt.find("Analyst 2:").unwrap();
        assert!(first < second);
        assert!(prompt.contains("first report"));
        assert!(prompt.contains("second report"));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [ { "text": "a" }, { "text": "b" } ] }
            }]
        });
        assert_eq!(GeminiClient::response_text(&body).unwrap(), "a\nb");
    }

    #[test]
    fn test_response_text_no_candidates_is_malformed() {
        let body = json!({ "candidates": [] });
        let err = GeminiClient::response_text(&body).unwrap_err();
        assert!(matches!(err, ArgusError::MalformedResponse(_)));
    }

    #[test]
    fn test_response_text_empty_parts_is_malformed() {
        let body = json!({
            "candidates": [{ "content": { "parts": [] } }]
        });
        assert!(GeminiClient::response_text(&body).is_err());
    }

    #[test]
    fn test_debug_impl_hides_api_key() {
        let debug_str = format!("{:?}", client());
        assert!(debug_str.contains("GeminiClient"));
        assert!(!debug_str.contains("test-key"));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeminiClient>();
    }
}
