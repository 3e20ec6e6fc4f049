use crate::types::{Result, ScraperError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";

/// A single completion request against the hosted text service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: Option<f64>,
    /// Ask the service to return a JSON object rather than free text
    pub json_response: bool,
}

/// Capability for text classification and extraction.
#[async_trait]
pub trait TextService: Send + Sync {
    /// Get the name of this service implementation
    fn service_name(&self) -> String;

    /// Run one completion and return the raw response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Groq-backed text service using the OpenAI-compatible chat endpoint.
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GROQ_API_BASE.to_string(),
        })
    }

    /// Build a client from the environment.
    ///
    /// A missing or empty `GROQ_API_KEY` is a hard startup failure; no
    /// partial run is attempted without the credential.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(GROQ_API_KEY_VAR)
            .map_err(|_| ScraperError::MissingCredential(GROQ_API_KEY_VAR.to_string()))?;

        if api_key.trim().is_empty() {
            return Err(ScraperError::MissingCredential(GROQ_API_KEY_VAR.to_string()));
        }

        info!("Initialized text service client from environment");
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TextService for GroqClient {
    fn service_name(&self) -> String {
        "groq".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            response_format: request.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!("Sending completion request to model {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScraperError::Service(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScraperError::Service(format!(
                "Service returned HTTP {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScraperError::Service(format!("Malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ScraperError::Service("Response contained no choices".to_string()))?;

        Ok(content)
    }
}

/// Rule-based mock text service for development and testing.
///
/// Replies are matched by substring against the user prompt; unmatched
/// prompts get the fallback reply, or an error when no fallback is set.
pub struct MockTextService {
    name: String,
    rules: Vec<(String, String)>,
    fallback: Option<String>,
}

impl MockTextService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            fallback: Some("False".to_string()),
        }
    }

    /// Reply with `reply` whenever the user prompt contains `needle`
    pub fn with_rule(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), reply.into()));
        self
    }

    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Make unmatched prompts fail, simulating a service outage
    pub fn failing(mut self) -> Self {
        self.fallback = None;
        self
    }
}

#[async_trait]
impl TextService for MockTextService {
    fn service_name(&self) -> String {
        format!("mock ({})", self.name)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        for (needle, reply) in &self.rules {
            if request.user.contains(needle) {
                return Ok(reply.clone());
            }
        }

        match &self.fallback {
            Some(reply) => Ok(reply.clone()),
            None => Err(ScraperError::Service(
                "Simulated text service failure".to_string(),
            )),
        }
    }
}
