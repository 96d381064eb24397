//! Engine configuration.
//! Layers, lowest first: built-in defaults, optional TOML/JSON/YAML file,
//! `FIELD_TRANSLATOR__SECTION__KEY` environment variables. The provider key
//! also falls back to `OPENAI_API_KEY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::translate::breaker::Cooldowns;

const ENV_PREFIX: &str = "FIELD_TRANSLATOR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub breaker: BreakerConfig,
}

/// OpenAI-compatible chat/completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Scopes the availability flag.
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens_cap: u32,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".into(),
            base_url: "https://api.openai.com".into(),
            model: "gpt-3.5-turbo".into(),
            temperature: 0.3,
            max_tokens_cap: 4096,
            timeout_secs: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub translation_ttl_secs: u64,
    pub key_prefix: String,
    pub memory_capacity: usize,
    /// When set, the SQLite store is used instead of the in-memory one.
    pub sqlite_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            translation_ttl_secs: 30 * 24 * 3600,
            key_prefix: "translation".into(),
            memory_capacity: 10_000,
            sqlite_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub quota_cooldown_secs: u64,
    pub failure_cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        let d = Cooldowns::default();
        Self {
            quota_cooldown_secs: d.quota.as_secs(),
            failure_cooldown_secs: d.failure.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn translation_ttl(&self) -> Duration {
        Duration::from_secs(self.translation_ttl_secs)
    }
}

impl BreakerConfig {
    pub fn cooldowns(&self) -> Cooldowns {
        Cooldowns {
            quota: Duration::from_secs(self.quota_cooldown_secs),
            failure: Duration::from_secs(self.failure_cooldown_secs),
        }
    }
}

impl EngineConfig {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&EngineConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: EngineConfig = builder.build()?.try_deserialize()?;
        if cfg.provider.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            cfg.provider.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.provider.model, "gpt-3.5-turbo");
        assert_eq!(cfg.provider.temperature, 0.3);
        assert_eq!(cfg.cache.translation_ttl(), Duration::from_secs(2_592_000));
        assert_eq!(cfg.breaker.cooldowns().quota, Duration::from_secs(3600));
        assert!(cfg.breaker.cooldowns().quota > cfg.breaker.cooldowns().failure);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translator.toml");
        std::fs::write(
            &path,
            "[provider]\nmodel = \"gpt-4o-mini\"\n\n[cache]\nkey_prefix = \"tr\"\nsqlite_path = \"/tmp/tr.db\"\n",
        )
        .unwrap();

        let cfg = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
        assert_eq!(cfg.provider.name, "openai");
        assert_eq!(cfg.cache.key_prefix, "tr");
        assert_eq!(cfg.cache.sqlite_path, Some(PathBuf::from("/tmp/tr.db")));
    }

    #[test]
    fn environment_overrides_file_and_defaults() {
        std::env::set_var("FIELD_TRANSLATOR__BREAKER__FAILURE_COOLDOWN_SECS", "42");
        let cfg = EngineConfig::load(None).unwrap();
        std::env::remove_var("FIELD_TRANSLATOR__BREAKER__FAILURE_COOLDOWN_SECS");
        assert_eq!(cfg.breaker.failure_cooldown_secs, 42);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EngineConfig::load(Some(Path::new("/nonexistent/translator.toml"))).is_err());
    }
}
