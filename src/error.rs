//! Crate-level error for setup paths (config, stores, clients).
//! `TranslationEngine::translate` never returns these.

use thiserror::Error;

use crate::config::ConfigError;
use crate::language::LanguageError;
use crate::translate::provider::ProviderError;
use crate::translate::store::CacheError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Language(#[from] LanguageError),
}

pub type Result<T> = std::result::Result<T, Error>;
