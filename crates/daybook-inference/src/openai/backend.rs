//! OpenAI-compatible completion backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use daybook_core::defaults::{
    COMPLETION_TIMEOUT_SECS, ENV_OPENAI_API_KEY, ENV_OPENAI_BASE_URL, ENV_OPENAI_GEN_MODEL,
    ENV_OPENAI_SYSTEM_PROMPT, ENV_OPENAI_TIMEOUT, FREQUENCY_PENALTY, GEN_MODEL,
    MAX_COMPLETION_TOKENS, OPENAI_URL, PRESENCE_PENALTY, SYSTEM_PROMPT, TEMPERATURE,
};
use daybook_core::{Completion, CompletionBackend, Error, Message, Result};

use super::error::{transport_error, upstream_error, OpenAIErrorCode};
use super::types::*;
use crate::prompt::validate_messages;

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication. Calls fail with `NotConfigured` without it.
    pub api_key: Option<String>,
    /// Model to use for generation. Must accept image inputs.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// System message prepended on the wire, if any.
    pub system_prompt: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_URL.to_string(),
            api_key: None,
            gen_model: GEN_MODEL.to_string(),
            timeout_seconds: COMPLETION_TIMEOUT_SECS,
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
        }
    }
}

impl OpenAIConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(ENV_OPENAI_BASE_URL).unwrap_or_else(|_| OPENAI_URL.to_string()),
            api_key: std::env::var(ENV_OPENAI_API_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gen_model: std::env::var(ENV_OPENAI_GEN_MODEL).unwrap_or_else(|_| GEN_MODEL.to_string()),
            timeout_seconds: std::env::var(ENV_OPENAI_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(COMPLETION_TIMEOUT_SECS),
            system_prompt: match std::env::var(ENV_OPENAI_SYSTEM_PROMPT) {
                Ok(prompt) if prompt.trim().is_empty() => None,
                Ok(prompt) => Some(prompt),
                Err(_) => Some(SYSTEM_PROMPT.to_string()),
            },
        }
    }
}

/// OpenAI-compatible completion backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            url = %config.base_url,
            model = %config.gen_model,
            timeout_secs = config.timeout_seconds,
            api_key_present = config.api_key.is_some(),
            "Initializing completion backend"
        );
        if config.api_key.is_none() {
            warn!(
                subsystem = "inference",
                "{} is not set; completion requests will be refused", ENV_OPENAI_API_KEY
            );
        }

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn wire_messages(&self, messages: &[Message]) -> Vec<Message> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = &self.config.system_prompt {
            wire.push(Message::system(system.clone()));
        }
        wire.extend_from_slice(messages);
        wire
    }
}

#[async_trait]
impl CompletionBackend for OpenAIBackend {
    async fn complete(&self, messages: &[Message]) -> Result<Completion> {
        validate_messages(messages)?;

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            Error::NotConfigured(format!("{} is not set", ENV_OPENAI_API_KEY))
        })?;

        let start = Instant::now();
        let request = ChatCompletionRequest {
            model: &self.config.gen_model,
            messages: self.wire_messages(messages),
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        };

        debug!(
            subsystem = "inference",
            op = "complete",
            model = %self.config.gen_model,
            message_count = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(subsystem = "inference", op = "complete", error = %e, "Completion API unreachable");
                transport_error(&e, self.config.timeout_seconds)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(subsystem = "inference", op = "complete", error = %e, "Failed to read completion response body");
            transport_error(&e, self.config.timeout_seconds)
        })?;

        if !status.is_success() {
            let code = OpenAIErrorCode::from_body(status.as_u16(), &body);
            warn!(
                subsystem = "inference",
                op = "complete",
                status = status.as_u16(),
                code = code.as_str(),
                body = %body,
                "Completion API returned an error"
            );
            return Err(upstream_error(status.as_u16(), body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(subsystem = "inference", op = "complete", error = %e, "Unparseable completion response");
            Error::UpstreamContractViolation(format!("response body is not a completion: {}", e))
        })?;

        let text = parsed.first_content().ok_or_else(|| {
            warn!(subsystem = "inference", op = "complete", body = %body, "Completion response has no content");
            Error::UpstreamContractViolation(
                "response is missing choices[0].message.content".to_string(),
            )
        })?;

        let completion = Completion {
            text: text.trim().to_string(),
            model: parsed
                .model
                .clone()
                .unwrap_or_else(|| self.config.gen_model.clone()),
            finish_reason: parsed.first_finish_reason(),
        };

        info!(
            subsystem = "inference",
            op = "complete",
            model = %completion.model,
            response_len = completion.text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion finished"
        );

        Ok(completion)
    }
}
