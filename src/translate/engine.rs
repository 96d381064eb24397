//! Translation orchestrator.
//!
//! Per call: drop blank fields, serve cache hits, and if anything is left and
//! the provider is not tripped, send the rest as one batch. Parsed items are
//! cached and merged with the hits. Nothing here fails the caller; a provider
//! failure trips the breaker and the call returns what it already has.
//!
//! Concurrent calls for the same uncached text are not coalesced; each may
//! reach the provider.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use super::breaker::AvailabilityBreaker;
use super::cache::MemoryStore;
use super::memo::TranslationCache;
use super::openai::ChatCompletionsClient;
use super::parser::ResponseParser;
use super::prompt;
use super::provider::TranslationProvider;
use super::sqlite_cache::SqliteStore;
use super::store::{CacheStore, Clock, SystemClock};
use super::{BatchResult, TranslationRequest};
use crate::config::EngineConfig;
use crate::language::Direction;

/// Field key used by `translate_text`.
const SINGLE_FIELD: &str = "text";

pub struct TranslationEngine {
    provider: Arc<dyn TranslationProvider>,
    cache: TranslationCache,
    breaker: AvailabilityBreaker,
    parser: ResponseParser,
}

impl TranslationEngine {
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        store: Arc<dyn CacheStore>,
        config: &EngineConfig,
    ) -> Self {
        Self::with_clock(provider, store, config, Arc::new(SystemClock))
    }

    /// `clock` must be the one the store uses, or breaker fallback and store
    /// TTLs will disagree.
    pub fn with_clock(
        provider: Arc<dyn TranslationProvider>,
        store: Arc<dyn CacheStore>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache: TranslationCache::new(
                Arc::clone(&store),
                config.cache.key_prefix.clone(),
                config.cache.translation_ttl(),
            ),
            breaker: AvailabilityBreaker::with_clock(store, config.breaker.cooldowns(), clock),
            parser: ResponseParser::default(),
        }
    }

    /// Wire the configured store and the chat/completions client.
    pub fn from_config(config: &EngineConfig) -> crate::Result<Self> {
        let store: Arc<dyn CacheStore> = match &config.cache.sqlite_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => Arc::new(MemoryStore::new(config.cache.memory_capacity)),
        };
        let provider = Arc::new(ChatCompletionsClient::new(&config.provider)?);
        info!(
            provider = %config.provider.name,
            model = %config.provider.model,
            store = store.name(),
            "translation engine ready"
        );
        Ok(Self::new(provider, store, config))
    }

    /// Translate every non-blank field. Returns cache hits plus whatever the
    /// single provider batch produced; keys absent from the result were not
    /// translated this time.
    pub async fn translate(&self, request: TranslationRequest) -> BatchResult {
        let span = info_span!(
            "translate",
            request_id = %uuid::Uuid::new_v4(),
            direction = %request.direction
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: TranslationRequest) -> BatchResult {
        let direction = request.direction;
        let fields = request.translatable();
        let mut result = BatchResult::new();

        if fields.is_empty() {
            debug!("nothing to translate");
            return result;
        }
        if direction.is_identity() {
            warn!(fields = fields.len(), "same-language direction requested, skipping");
            return result;
        }

        let requested = fields.len();
        let mut pending = fields;
        pending.retain(|key, text| match self.cache.get(text.as_str(), direction) {
            Some(hit) => {
                result.insert(key.clone(), hit);
                false
            }
            None => true,
        });
        let hits = result.len();

        if pending.is_empty() {
            info!(hits, "served entirely from cache");
            return result;
        }

        let provider = self.provider.name();
        if !self.breaker.is_available(provider) {
            warn!(
                provider,
                hits,
                skipped = pending.len(),
                "provider unavailable, returning cache hits only"
            );
            return result;
        }

        let Some(batch) = prompt::build(direction, &pending) else {
            return result;
        };

        let translated = match self.provider.translate_batch(&batch).await {
            Ok(raw) => {
                debug!(reply_len = raw.len(), "provider replied");
                self.parser.parse(&raw, &batch.keys)
            }
            Err(e) => {
                error!(provider, error = %e, "batch translation failed");
                self.breaker.record_failure(provider, &e);
                return result;
            }
        };

        let fresh = translated.len();
        for (key, value) in translated {
            if let Some(source) = pending.get(&key) {
                self.cache.put(source, direction, &value);
            }
            result.insert(key, value);
        }

        info!(requested, hits, translated = fresh, "translation finished");
        result
    }

    /// Translate one text. `None` when it could not be translated now.
    pub async fn translate_text(&self, text: &str, direction: Direction) -> Option<String> {
        let request = TranslationRequest::new(direction).field(SINGLE_FIELD, text);
        self.translate(request).await.remove(SINGLE_FIELD)
    }

    /// Operator action: drop cached translations for one direction or all.
    pub fn clear_cache(&self, direction: Option<Direction>) -> usize {
        self.cache.clear(direction)
    }

    /// Sweep expired entries from the backing store.
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn is_provider_available(&self) -> bool {
        self.breaker.is_available(self.provider.name())
    }

    /// Operator action: close a tripped breaker before its TTL.
    pub fn reset_availability(&self) {
        self.breaker.reset(self.provider.name());
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
