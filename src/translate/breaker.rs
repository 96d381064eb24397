//! Provider availability breaker.
//!
//! State is one boolean-with-TTL per provider kept in the shared `CacheStore`
//! under `provider_available:<name>`. Absent or `true` means usable; `false`
//! holds until the TTL runs out. There is no half-open probe: once the flag
//! expires the next request goes straight to the provider.
//!
//! If the shared store cannot be written, the trip is remembered in-process
//! so at least this process stops calling a failing provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::provider::ProviderError;
use super::store::{CacheStore, Clock, SystemClock};

const FLAG_PREFIX: &str = "provider_available";
const UNAVAILABLE: &str = "false";

/// Cooldown windows chosen by failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldowns {
    /// Rate-limit / quota exhaustion: continued failure is near certain.
    pub quota: Duration,
    /// Any other hard failure.
    pub failure: Duration,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            quota: Duration::from_secs(3600),
            failure: Duration::from_secs(300),
        }
    }
}

pub struct AvailabilityBreaker {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    cooldowns: Cooldowns,
    /// provider -> open-until, only populated when the store write failed.
    local: Mutex<HashMap<String, Duration>>,
}

impl AvailabilityBreaker {
    pub fn new(store: Arc<dyn CacheStore>, cooldowns: Cooldowns) -> Self {
        Self::with_clock(store, cooldowns, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CacheStore>, cooldowns: Cooldowns, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cooldowns,
            local: Mutex::new(HashMap::new()),
        }
    }

    fn flag_key(provider: &str) -> String {
        format!("{FLAG_PREFIX}:{provider}")
    }

    pub fn is_available(&self, provider: &str) -> bool {
        if self.locally_open(provider) {
            debug!(provider, "provider unavailable (local flag)");
            return false;
        }
        match self.store.get(&Self::flag_key(provider)) {
            Ok(Some(flag)) if flag == UNAVAILABLE => {
                debug!(provider, "provider unavailable (shared flag)");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, provider, "availability read failed, assuming available");
                true
            }
        }
    }

    pub fn mark_unavailable(&self, provider: &str, ttl: Duration) {
        warn!(provider, cooldown_secs = ttl.as_secs(), "provider marked unavailable");
        if let Err(e) = self.store.set(&Self::flag_key(provider), UNAVAILABLE, ttl) {
            warn!(error = %e, provider, "availability write failed, tripping locally");
            let until = self.clock.now().checked_add(ttl).unwrap_or(Duration::MAX);
            self.local.lock().insert(provider.to_string(), until);
        }
    }

    /// Trip the breaker with the cooldown that fits `error`.
    pub fn record_failure(&self, provider: &str, error: &ProviderError) {
        let ttl = if error.is_quota() {
            self.cooldowns.quota
        } else {
            self.cooldowns.failure
        };
        self.mark_unavailable(provider, ttl);
    }

    /// Operator override: make the provider usable again now.
    pub fn reset(&self, provider: &str) {
        self.local.lock().remove(provider);
        if let Err(e) = self.store.delete(&Self::flag_key(provider)) {
            warn!(error = %e, provider, "availability reset failed");
        } else {
            info!(provider, "provider availability reset");
        }
    }

    fn locally_open(&self, provider: &str) -> bool {
        let now = self.clock.now();
        let mut local = self.local.lock();
        match local.get(provider) {
            Some(until) if now < *until => true,
            Some(_) => {
                local.remove(provider);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::cache::MemoryStore;
    use crate::translate::memo::tests::DownStore;
    use crate::translate::store::ManualClock;

    fn breaker(clock: Arc<ManualClock>) -> AvailabilityBreaker {
        let store = Arc::new(MemoryStore::with_clock(16, clock.clone()));
        AvailabilityBreaker::with_clock(store, Cooldowns::default(), clock)
    }

    #[test]
    fn absent_flag_means_available() {
        let b = breaker(ManualClock::new(Duration::from_secs(10)));
        assert!(b.is_available("openai"));
    }

    #[test]
    fn trip_holds_until_ttl_then_resets() {
        let clock = ManualClock::new(Duration::from_secs(10));
        let b = breaker(clock.clone());
        b.mark_unavailable("openai", Duration::from_secs(60));
        assert!(!b.is_available("openai"));
        assert!(b.is_available("gemini"));

        clock.advance(Duration::from_secs(59));
        assert!(!b.is_available("openai"));
        clock.advance(Duration::from_secs(1));
        assert!(b.is_available("openai"));
    }

    #[test]
    fn quota_failures_use_the_longer_cooldown() {
        let clock = ManualClock::new(Duration::from_secs(10));
        let b = breaker(clock.clone());

        b.record_failure("openai", &ProviderError::Timeout);
        clock.advance(Cooldowns::default().failure);
        assert!(b.is_available("openai"));

        b.record_failure("openai", &ProviderError::QuotaExhausted("insufficient_quota".into()));
        clock.advance(Cooldowns::default().failure);
        assert!(!b.is_available("openai"));
        clock.advance(Cooldowns::default().quota - Cooldowns::default().failure);
        assert!(b.is_available("openai"));
    }

    #[test]
    fn unwritable_store_still_trips_in_process() {
        let clock = ManualClock::new(Duration::from_secs(10));
        let b = AvailabilityBreaker::with_clock(Arc::new(DownStore), Cooldowns::default(), clock.clone());
        assert!(b.is_available("openai"));

        b.mark_unavailable("openai", Duration::from_secs(30));
        assert!(!b.is_available("openai"));
        clock.advance(Duration::from_secs(30));
        assert!(b.is_available("openai"));
    }

    #[test]
    fn oversized_cooldown_does_not_overflow() {
        let clock = ManualClock::new(Duration::from_secs(10));
        let shared = breaker(clock.clone());
        let local = AvailabilityBreaker::with_clock(Arc::new(DownStore), Cooldowns::default(), clock);

        for b in [&shared, &local] {
            b.mark_unavailable("openai", Duration::MAX);
            assert!(!b.is_available("openai"));
        }
    }

    #[test]
    fn reset_clears_an_open_breaker() {
        let b = breaker(ManualClock::new(Duration::from_secs(10)));
        b.mark_unavailable("openai", Duration::from_secs(600));
        b.reset("openai");
        assert!(b.is_available("openai"));
    }
}
