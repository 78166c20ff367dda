// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completion endpoints.
//!
//! Provides [`ChatCompletionClient`], the [`CompletionBackend`] used by the
//! LLM scoring path. Requests are single-turn and bounded by a timeout; there
//! is no retry, a failure is reported and the caller degrades.

use std::time::Duration;

use async_trait::async_trait;
use conclave_config::model::ClassifierConfig;
use conclave_core::{CompletionBackend, ConclaveError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Chat-completion request body.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// The subset of the chat-completion response we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl ChatCompletionClient {
    /// Creates a client for the given endpoint.
    ///
    /// `api_key`, when present, is sent as a bearer token.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: impl Into<String>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self, ConclaveError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    ConclaveError::Config(format!("invalid API key header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConclaveError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            temperature,
            timeout,
        })
    }

    /// Creates a client from the `[classifier]` config section.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConclaveError> {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            config.model.clone(),
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `prompt` as a single user message and returns the reply text.
    pub async fn chat(&self, prompt: &str) -> Result<String, ConclaveError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "chat completion response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConclaveError::Provider {
                message: format!("API returned {status}: {body}"),
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ConclaveError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ConclaveError::Provider {
                message: "API response contained no message content".into(),
                source: None,
            })
    }

    fn transport_error(&self, e: reqwest::Error) -> ConclaveError {
        if e.is_timeout() {
            ConclaveError::Timeout {
                duration: self.timeout,
            }
        } else {
            ConclaveError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ConclaveError> {
        self.chat(prompt).await
    }
}
