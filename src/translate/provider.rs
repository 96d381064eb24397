//! Translation provider capability.
//! One call per batch: the provider receives the whole prompt and returns the
//! raw reply text. Parsing happens elsewhere, so providers stay swappable.

use async_trait::async_trait;
use thiserror::Error;

use super::prompt::BatchPrompt;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("provider request timed out")]
    Timeout,
    #[error("rate limited (code: {})", code.as_deref().unwrap_or("none"))]
    RateLimited { code: Option<String> },
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("unexpected status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Rate-limit and quota failures get the long cooldown.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::QuotaExhausted(_)
        )
    }
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Stable name; scopes the availability flag.
    fn name(&self) -> &str;

    /// Send one batch prompt and return the raw reply text.
    async fn translate_batch(&self, prompt: &BatchPrompt) -> Result<String, ProviderError>;
}
