//! Model client abstraction.
//!
//! Every stage talks to the language model through the [`LlmClient`] trait,
//! which has exactly two implementations: [`OllamaClient`], backed by a local
//! Ollama server, and [`OfflineLlm`], a deterministic stand-in that returns a
//! fixed minimal reply. The implementation is chosen once at construction
//! time, so the whole pipeline can run (and be tested) without a model
//! backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the model collaborator. Stages never surface these to the
/// caller; each stage maps them to its deterministic fallback.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model backend returned an error: {0}")]
    Api(String),
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A complete chat request: model name, message list and generation options.
/// Call-compatible across all four stages.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    /// Output token budget (Ollama `num_predict`).
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from a chat completion.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
}

/// Capability interface for chat completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Short provider name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Ollama implementation
// ---------------------------------------------------------------------------

/// Chat client for a local Ollama server (`POST {host}/api/chat`).
pub struct OllamaClient {
    client: reqwest::Client,
    host: String,
}

#[derive(Serialize)]
struct OllamaChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaClient {
    /// Create a client for the given Ollama host, e.g. `http://localhost:11434`.
    pub fn new(host: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.host);

        debug!(model = %request.model, url = %url, "Sending chat request");

        let body = OllamaChatBody {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(LlmError::Api(format!("HTTP {}", response.status())));
        }

        let parsed: OllamaChatResponse = response.json().await?;

        if let Some(error) = parsed.error {
            return Err(LlmError::Api(error));
        }

        let content = parsed.message.map(|m| m.content).unwrap_or_default();
        debug!(chars = content.chars().count(), "Chat response received");

        Ok(ChatResponse { content })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ---------------------------------------------------------------------------
// Offline stand-in
// ---------------------------------------------------------------------------

/// Deterministic offline model client. Always succeeds with a fixed reply,
/// which the stages treat as degenerate output and replace with their
/// templated fallbacks.
#[derive(Debug, Clone)]
pub struct OfflineLlm {
    reply: String,
}

impl OfflineLlm {
    /// Stub returning an empty-list placeholder, the same degenerate reply
    /// the stages are required to tolerate.
    pub fn new() -> Self {
        Self { reply: "[]".to_string() }
    }

    /// Stub returning a caller-chosen fixed reply.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

impl Default for OfflineLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OfflineLlm {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse { content: self.reply.clone() })
    }

    fn name(&self) -> &str {
        "offline"
    }
}
