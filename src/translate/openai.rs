//! OpenAI-compatible chat/completions client.
//! One POST per batch, no retries: a failed call is reported to the caller,
//! which trips the availability breaker instead of hammering the endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::prompt::BatchPrompt;
use super::provider::{ProviderError, TranslationProvider};
use crate::config::ProviderConfig;

const QUOTA_CODE: &str = "insufficient_quota";

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    name: String,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens_cap: u32,
}

impl ChatCompletionsClient {
    /// Build a client. A missing key is not an error here; every call then
    /// fails with `NotConfigured` so the breaker can record it.
    pub fn new(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http,
            name: cfg.name.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens_cap: cfg.max_tokens_cap,
        })
    }

    fn request_body(&self, prompt: &BatchPrompt) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": self.temperature,
            "max_tokens": prompt.estimated_max_tokens(self.max_tokens_cap),
        })
    }
}

#[async_trait]
impl TranslationProvider for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate_batch(&self, prompt: &BatchPrompt) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!("no API key for provider {}", self.name))
        })?;

        debug!(
            items = prompt.keys.len(),
            direction = %prompt.direction,
            model = %self.model,
            "sending translation batch"
        );

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_failure(status.as_u16(), &body);
            error!(status = status.as_u16(), error = %err, "provider call failed");
            return Err(err);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing choices[0].message.content".into())
            })?;

        if let Some(usage) = parsed.usage {
            debug!(total_tokens = usage.total_tokens, "provider usage");
        }
        Ok(content.trim().to_string())
    }
}

/// Map a non-2xx reply to an error, reading `error.code` from the body.
fn classify_failure(status: u16, body: &str) -> ProviderError {
    let code = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.code);

    if code.as_deref() == Some(QUOTA_CODE) {
        warn!(status, "provider quota exhausted");
        return ProviderError::QuotaExhausted(QUOTA_CODE.into());
    }
    if status == 429 {
        return ProviderError::RateLimited { code };
    }
    ProviderError::Http {
        status,
        body: body.chars().take(200).collect(),
    }
}

// --- response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
}
