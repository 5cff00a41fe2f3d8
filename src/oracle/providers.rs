use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::adapter::OracleAdapter;
use crate::error::{CourtSeerError, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;

/// Sends the request and returns the body, turning non-2xx answers into
/// `OracleUnavailable`.
async fn send_checked(source_id: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("{} API error ({}): {}", source_id, status, error_text);
        return Err(CourtSeerError::oracle_unavailable(
            source_id,
            format!("HTTP {}: {}", status, error_text),
        ));
    }

    Ok(response)
}

fn non_empty(source_id: &str, text: Option<String>) -> Result<String> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CourtSeerError::oracle_unavailable(source_id, "empty completion"))
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GeminiOracle {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", GEMINI_BASE_URL, self.model)
    }

    fn extract_text(response: GeminiResponse) -> Option<String> {
        response
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .reduce(|mut acc, text| {
                acc.push_str(&text);
                acc
            })
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[async_trait]
impl OracleAdapter for GeminiOracle {
    fn source_id(&self) -> &str {
        "Gemini"
    }

    async fn submit(&self, prompt: &str) -> Result<String> {
        debug!("Asking Gemini ({})...", self.model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let builder = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request);

        let response: GeminiResponse = send_checked(self.source_id(), builder).await?.json().await?;
        non_empty(self.source_id(), Self::extract_text(response))
    }
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnthropicOracle {
    api_key: String,
    model: String,
    client: Client,
}

impl AnthropicOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    fn extract_text(response: AnthropicResponse) -> Option<String> {
        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[async_trait]
impl OracleAdapter for AnthropicOracle {
    fn source_id(&self) -> &str {
        "Claude"
    }

    async fn submit(&self, prompt: &str) -> Result<String> {
        debug!("Asking Claude ({})...", self.model);

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage::user(prompt)],
        };

        let builder = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);

        let response: AnthropicResponse = send_checked(self.source_id(), builder).await?.json().await?;
        non_empty(self.source_id(), Self::extract_text(response))
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OpenAiOracle {
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: "OpenAI".to_string(),
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            client: Client::new(),
        }
    }

    /// Points the adapter at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn extract_text(response: ChatCompletionResponse) -> Option<String> {
        response.choices.into_iter().next()?.message.content
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl OracleAdapter for OpenAiOracle {
    fn source_id(&self) -> &str {
        &self.name
    }

    async fn submit(&self, prompt: &str) -> Result<String> {
        debug!("Asking {} ({})...", self.name, self.model);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
        };

        let builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request);

        let response: ChatCompletionResponse = send_checked(self.source_id(), builder).await?.json().await?;
        non_empty(self.source_id(), Self::extract_text(response))
    }
}
