//! Supported languages and translation directions.
//! A direction is an ordered (from, to) pair; its tag `ko_to_en` scopes cache keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Languages the engine can translate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
    Es,
    Zh,
    Ja,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("unsupported language code: {0}")]
    Unsupported(String),
    #[error("malformed direction tag: {0} (expected e.g. ko_to_en)")]
    MalformedDirection(String),
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Ko,
        Language::En,
        Language::Es,
        Language::Zh,
        Language::Ja,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
            Language::Es => "es",
            Language::Zh => "zh",
            Language::Ja => "ja",
        }
    }

    /// English display name, used in provider instructions.
    pub fn english_name(self) -> &'static str {
        match self {
            Language::Ko => "Korean",
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Zh => "Chinese (Simplified)",
            Language::Ja => "Japanese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept region-qualified codes ("en-US", "zh_CN") by their base language.
        let base = s
            .split(['-', '_'])
            .next()
            .unwrap_or(s)
            .trim()
            .to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == base)
            .ok_or_else(|| LanguageError::Unsupported(s.to_string()))
    }
}

/// Ordered source → target language pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub from: Language,
    pub to: Language,
}

impl Direction {
    pub fn new(from: Language, to: Language) -> Self {
        Self { from, to }
    }

    /// Stable tag such as `ko_to_en`.
    pub fn tag(&self) -> String {
        format!("{}_to_{}", self.from.code(), self.to.code())
    }

    /// Same-language directions are a caller error; the engine refuses them.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_to_{}", self.from.code(), self.to.code())
    }
}

impl FromStr for Direction {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once("_to_")
            .ok_or_else(|| LanguageError::MalformedDirection(s.to_string()))?;
        Ok(Direction::new(from.parse()?, to.parse()?))
    }
}
