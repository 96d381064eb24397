//! Scriptable provider for tests and offline runs.
//!
//! Replies are taken from a queue; once it is empty the mock falls back to its
//! mode. Every call is counted and its prompt kept for inspection.
//!
//! ```ignore
//! let mock = MockProvider::new(MockMode::Suffix);
//! mock.push_reply("ITEM_title: Hello");
//! mock.push_failure(ProviderError::RateLimited { code: None });
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::parser;
use super::prompt::{BatchPrompt, ITEM_MARKER};
use super::provider::{ProviderError, TranslationProvider};

#[derive(Debug, Clone)]
pub enum MockMode {
    /// Answer every item in marker format with the target code appended:
    /// `ITEM_title: 안녕_en`.
    Suffix,
    /// Always return this raw text.
    Fixed(String),
    /// Always fail with this error.
    Error(ProviderError),
}

enum Scripted {
    Reply(String),
    Failure(ProviderError),
}

pub struct MockProvider {
    name: String,
    mode: MockMode,
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<BatchPrompt>>,
    delay: Duration,
}

impl MockProvider {
    pub fn new(mode: MockMode) -> Self {
        Self {
            name: "mock".into(),
            mode,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_reply(&self, raw: impl Into<String>) {
        self.script.lock().push_back(Scripted::Reply(raw.into()));
    }

    pub fn push_failure(&self, error: ProviderError) {
        self.script.lock().push_back(Scripted::Failure(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<BatchPrompt> {
        self.prompts.lock().clone()
    }

    fn suffix_reply(prompt: &BatchPrompt) -> String {
        // The prompt is itself in marker format, so the parser recovers the sources.
        let sources = parser::parse(&prompt.user, &prompt.keys);
        let target = prompt.direction.to.code();
        sources
            .iter()
            .map(|(key, text)| format!("{ITEM_MARKER}{key}: {text}_{target}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate_batch(&self, prompt: &BatchPrompt) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(Scripted::Reply(raw)) => Ok(raw),
            Some(Scripted::Failure(e)) => Err(e),
            None => match &self.mode {
                MockMode::Suffix => Ok(Self::suffix_reply(prompt)),
                MockMode::Fixed(raw) => Ok(raw.clone()),
                MockMode::Error(e) => Err(e.clone()),
            },
        }
    }
}
