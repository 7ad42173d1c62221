//! Generative text client for the Gemini `generateContent` API
//!
//! Sends a prompt and isolates the JSON payload from a possibly noisy
//! natural-language response. No semantic validation happens here: callers
//! still parse the returned text and may fail on their own terms.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TripCraftConfig;
use crate::{Result, TripCraftError};

/// Abstraction over the text-generation collaborator
pub trait TextGenerator {
    /// Send a prompt and return the extracted JSON text of the response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Send a prompt and parse the extracted text as a JSON document
    async fn generate_document(&self, prompt: &str) -> Result<Value> {
        let raw = self.generate(prompt).await?;
        serde_json::from_str(&raw).map_err(|e| {
            TripCraftError::malformed_response(format!("generated payload is not valid JSON: {e}"))
        })
    }
}

/// HTTP client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client from configuration
    pub fn new(config: &TripCraftConfig) -> Result<Self> {
        let api_key = config
            .gemini
            .api_key
            .clone()
            .ok_or_else(|| TripCraftError::config("Gemini API key is required"))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(
                config.gemini.connect_timeout_seconds.into(),
            ))
            .timeout(Duration::from_secs(config.gemini.read_timeout_seconds.into()))
            .user_agent(concat!("tripcraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TripCraftError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.gemini.model.clone(),
            base_url: config.gemini.base_url.clone(),
        })
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!("Sending generation request to model {}", self.model);

        let response = self
            .client
            .post(&url)
            .json(&wire::GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| {
                TripCraftError::upstream(None, format!("generation request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripCraftError::upstream(Some(status.as_u16()), body));
        }

        let parsed: wire::GenerateResponse = response.json().await.map_err(|e| {
            TripCraftError::malformed_response(format!("unreadable generation response: {e}"))
        })?;

        if let Some(reason) = parsed.block_reason() {
            warn!("Generation request blocked: {}", reason);
            return Err(TripCraftError::safety_blocked(reason));
        }

        let text = parsed
            .primary_text()
            .or_else(|| parsed.scan_text())
            .ok_or_else(|| {
                TripCraftError::malformed_response("no text part in generation response")
            })?;

        Ok(extract_json_block(text))
    }
}

/// Strip code fences and stray backticks, then cut the text down to the JSON
/// span between the first `{`/`[` and the last `}`/`]`.
///
/// Models wrap JSON payloads in explanatory text and code fences; this is a
/// best-effort isolation of the JSON span. When no span can be located the
/// fence-stripped text is returned unchanged, so the caller's parse fails
/// explicitly.
#[must_use]
pub fn extract_json_block(raw: &str) -> String {
    let mut s = raw.trim();

    if let Some(rest) = s.strip_prefix("```json") {
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    let s = s.trim_start_matches('`').trim_end_matches('`');

    let start = match (s.find('{'), s.find('[')) {
        (Some(obj), Some(arr)) => Some(obj.min(arr)),
        (Some(obj), None) => Some(obj),
        (None, Some(arr)) => Some(arr),
        (None, None) => None,
    };
    let Some(start) = start else {
        return s.trim().to_string();
    };

    let end = match (s.rfind('}'), s.rfind(']')) {
        (Some(obj), Some(arr)) => Some(obj.max(arr)),
        (Some(obj), None) => Some(obj),
        (None, Some(arr)) => Some(arr),
        (None, None) => None,
    };
    match end {
        Some(end) if end >= start => s[start..=end].trim().to_string(),
        _ => s.trim().to_string(),
    }
}

/// Request and response shapes of the `generateContent` API
mod wire {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct GenerateRequest {
        pub contents: Vec<Content>,
        #[serde(rename = "generationConfig")]
        pub generation_config: GenerationConfig,
    }

    #[derive(Debug, Serialize)]
    pub struct Content {
        pub parts: Vec<Part>,
    }

    #[derive(Debug, Serialize)]
    pub struct Part {
        pub text: String,
    }

    #[derive(Debug, Serialize)]
    pub struct GenerationConfig {
        #[serde(rename = "responseMimeType")]
        pub response_mime_type: &'static str,
        pub temperature: f32,
    }

    impl GenerateRequest {
        pub fn from_prompt(prompt: &str) -> Self {
            Self {
                contents: vec![Content {
                    parts: vec![Part {
                        text: prompt.to_string(),
                    }],
                }],
                generation_config: GenerationConfig {
                    response_mime_type: "application/json",
                    temperature: 0.2,
                },
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct GenerateResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
        #[serde(rename = "promptFeedback")]
        pub prompt_feedback: Option<PromptFeedback>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Candidate {
        pub content: Option<CandidateContent>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CandidateContent {
        #[serde(default)]
        pub parts: Vec<CandidatePart>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CandidatePart {
        pub text: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PromptFeedback {
        #[serde(rename = "blockReason")]
        pub block_reason: Option<String>,
    }

    impl GenerateResponse {
        /// Block reason reported by the upstream content policy, if any
        pub fn block_reason(&self) -> Option<String> {
            self.prompt_feedback
                .as_ref()?
                .block_reason
                .as_ref()
                .filter(|reason| !reason.trim().is_empty())
                .cloned()
        }

        /// The expected field path: first part of the first candidate
        pub fn primary_text(&self) -> Option<&str> {
            self.candidates
                .first()?
                .content
                .as_ref()?
                .parts
                .first()?
                .text
                .as_deref()
        }

        /// Backup scan for responses that use a different structure
        pub fn scan_text(&self) -> Option<&str> {
            self.candidates
                .iter()
                .filter_map(|candidate| candidate.content.as_ref())
                .flat_map(|content| content.parts.iter())
                .find_map(|part| part.text.as_deref())
        }
    }
}
