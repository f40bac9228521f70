//! Chat-completions oracle over HTTP.
//!
//! # Responsibility
//! - Post one judgment prompt to an OpenAI-style `chat/completions` endpoint.
//! - Extract `choices[0].message.content` as the raw reply.
//!
//! # Invariants
//! - Every request is bounded by the configured timeout.
//! - The API key is read once, from the configured environment variable.

use crate::config::OracleConfig;
use crate::oracle::prompt::PromptContext;
use crate::oracle::{OracleClient, OracleError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

/// Blocking HTTP oracle client.
#[derive(Debug, Clone)]
pub struct HttpOracleClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpOracleClient {
    /// Builds a client from configuration, reading the API key from the
    /// environment variable named by `config.api_key_env`.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::new(
            config.endpoint.as_str(),
            config.model.as_str(),
            api_key,
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| OracleError::Setup(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }
}

impl OracleClient for HttpOracleClient {
    fn request_judgment(&self, context: &PromptContext) -> Result<String, OracleError> {
        let prompt = context.render();
        let body = ChatRequest {
            model: self.model.as_str(),
            messages: [ChatMessage {
                role: "user",
                content: prompt.as_str(),
            }],
            temperature: 0.0,
        };

        let mut request = self.client.post(self.endpoint.as_str()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::HttpStatus(status.as_u16()));
        }

        let parsed: ChatResponse = response.json().map_err(map_reqwest_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                OracleError::MalformedReply("missing choices[0].message.content".to_string())
            })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout
    } else if err.is_decode() {
        OracleError::MalformedReply(err.to_string())
    } else {
        OracleError::Transport(err.to_string())
    }
}
