//! Bulk field translation.
//! Callers hand over a map of field key → source text plus a direction and get
//! back whatever could be translated: cache hits plus at most one provider
//! batch per call. Failures degrade the result, they never raise.

pub mod breaker;
pub mod cache;
pub mod engine;
pub mod hasher;
pub mod memo;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod sqlite_cache;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Direction;

pub use engine::TranslationEngine;

/// Field key → translated text. May hold fewer keys than were requested;
/// a missing key means "not translated this round".
pub type BatchResult = BTreeMap<String, String>;

/// Fields to translate in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub direction: Direction,
    pub fields: BTreeMap<String, String>,
}

impl TranslationRequest {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(key.into(), text.into());
        self
    }

    /// Accepts optional values; `None` is treated like an empty field.
    pub fn from_fields<K, V, I>(direction: Direction, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, Option<V>)>,
    {
        Self {
            direction,
            fields: fields
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k.into(), v.into())))
                .collect(),
        }
    }

    /// Fields with non-blank text, trimmed. Only these are ever sent or cached.
    pub fn translatable(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(k, v)| {
                let text = v.trim();
                (!text.is_empty()).then(|| (k.clone(), text.to_string()))
            })
            .collect()
    }
}
