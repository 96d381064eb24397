//! Translation memo over a `CacheStore`.
//! Store failures never reach the caller: reads degrade to misses and writes
//! are logged and dropped, since caching only saves provider calls.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::hasher;
use super::store::CacheStore;
use crate::language::Direction;

/// Default lifetime of a cached translation: 30 days.
pub const DEFAULT_TRANSLATION_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

pub struct TranslationCache {
    store: Arc<dyn CacheStore>,
    prefix: String,
    ttl: Duration,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn CacheStore>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn get(&self, text: &str, direction: Direction) -> Option<String> {
        let key = hasher::cache_key(&self.prefix, text, direction);
        match self.store.get(&key) {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, backend = self.store.name(), "cache read failed, treating as miss");
                None
            }
        }
    }

    pub fn put(&self, text: &str, direction: Direction, translated: &str) {
        let key = hasher::cache_key(&self.prefix, text, direction);
        if let Err(e) = self.store.set(&key, translated, self.ttl) {
            warn!(error = %e, backend = self.store.name(), "cache write failed");
        } else {
            debug!(direction = %direction, "translation cached");
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Remove cached translations for one direction, or all of them.
    pub fn clear(&self, direction: Option<Direction>) -> usize {
        let prefix = match direction {
            Some(d) => hasher::direction_prefix(&self.prefix, d),
            None => hasher::namespace_prefix(&self.prefix),
        };
        match self.store.delete_prefix(&prefix) {
            Ok(removed) => {
                info!(removed, scope = %prefix, "translation cache cleared");
                removed
            }
            Err(e) => {
                warn!(error = %e, scope = %prefix, "translation cache clear failed");
                0
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::language::Language;
    use crate::translate::cache::MemoryStore;
    use crate::translate::store::{CacheError, CacheResult};

    /// Store whose every operation fails, as if the backend were unreachable.
    pub(crate) struct DownStore;

    impl CacheStore for DownStore {
        fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Connection("refused".into()))
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::Connection("refused".into()))
        }
        fn delete(&self, _key: &str) -> CacheResult<bool> {
            Err(CacheError::Connection("refused".into()))
        }
        fn delete_prefix(&self, _prefix: &str) -> CacheResult<usize> {
            Err(CacheError::Connection("refused".into()))
        }
        fn purge_expired(&self) -> usize {
            0
        }
        fn name(&self) -> &'static str {
            "down"
        }
    }

    fn ko_en() -> Direction {
        Direction::new(Language::Ko, Language::En)
    }

    #[test]
    fn put_is_found_by_get_for_same_text_and_direction() {
        let cache = TranslationCache::new(
            Arc::new(MemoryStore::new(16)),
            "translation",
            DEFAULT_TRANSLATION_TTL,
        );
        cache.put("목표", ko_en(), "Goal");
        assert_eq!(cache.get("목표", ko_en()).as_deref(), Some("Goal"));
        assert_eq!(cache.get("목표", Direction::new(Language::Ko, Language::Ja)), None);
    }

    #[test]
    fn unreachable_store_reads_as_miss_and_swallows_writes() {
        let cache = TranslationCache::new(Arc::new(DownStore), "translation", DEFAULT_TRANSLATION_TTL);
        cache.put("목표", ko_en(), "Goal");
        assert_eq!(cache.get("목표", ko_en()), None);
        assert_eq!(cache.clear(None), 0);
    }

    #[test]
    fn clear_by_direction_leaves_other_directions() {
        let store = Arc::new(MemoryStore::new(16));
        let cache = TranslationCache::new(store.clone(), "translation", DEFAULT_TRANSLATION_TTL);
        let en_ko = Direction::new(Language::En, Language::Ko);
        cache.put("하나", ko_en(), "one");
        cache.put("둘", ko_en(), "two");
        cache.put("three", en_ko, "셋");
        store
            .set("provider_available:openai", "false", Duration::from_secs(60))
            .unwrap();

        assert_eq!(cache.clear(Some(ko_en())), 2);
        assert_eq!(cache.get("three", en_ko).as_deref(), Some("셋"));
        assert_eq!(cache.clear(None), 1);
        assert_eq!(store.len(), 1);
    }
}
