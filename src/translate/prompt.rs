//! Batch prompt construction.
//! Every pending item goes into one user message as `ITEM_<key>: <text>`, one
//! per line, and the instruction asks for the same shape back so the parser
//! can correlate replies with keys.

use std::collections::BTreeMap;

use tracing::warn;

use crate::language::Direction;

/// Prefix that tags each item line in both prompt and reply.
pub const ITEM_MARKER: &str = "ITEM_";

/// A ready-to-send batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPrompt {
    pub direction: Direction,
    pub system: String,
    pub user: String,
    /// Keys actually serialized, in prompt order.
    pub keys: Vec<String>,
    /// Total characters of source text, for token estimation.
    pub source_chars: usize,
}

impl BatchPrompt {
    /// `2 × source chars + 500`, capped. Translations into English
    /// routinely run twice the length of CJK input.
    pub fn estimated_max_tokens(&self, cap: u32) -> u32 {
        let estimate = self.source_chars.saturating_mul(2).saturating_add(500);
        u32::try_from(estimate).unwrap_or(u32::MAX).min(cap)
    }
}

fn system_instruction(direction: Direction) -> String {
    format!(
        "You are a helpful assistant that translates {} text to {}. \
         Always respond with the format \"{ITEM_MARKER}key: translated_text\" for each item, one per line.",
        direction.from.english_name(),
        direction.to.english_name(),
    )
}

fn user_header(direction: Direction) -> String {
    format!(
        "Translate the following {} texts to {}. \
         Respond only with lines of the form '{ITEM_MARKER}key: translation', keeping every key unchanged:\n\n",
        direction.from.english_name(),
        direction.to.english_name(),
    )
}

/// Keys become part of the line marker, so they cannot carry a colon or a
/// break. The parser trims the key it reads back, so edge whitespace would
/// never match either.
fn is_usable_key(key: &str) -> bool {
    !key.is_empty() && key.trim() == key && !key.contains([':', '：', '\n', '\r'])
}

/// Build the batch for `items`. Returns `None` when nothing is left to send.
pub fn build(direction: Direction, items: &BTreeMap<String, String>) -> Option<BatchPrompt> {
    let mut user = user_header(direction);
    let mut keys = Vec::with_capacity(items.len());
    let mut source_chars = 0;

    for (key, text) in items {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if !is_usable_key(key) {
            warn!(key = %key, "field key cannot be used as an item marker, skipping");
            continue;
        }
        user.push_str(ITEM_MARKER);
        user.push_str(key);
        user.push_str(": ");
        user.push_str(text);
        user.push('\n');
        source_chars += text.chars().count();
        keys.push(key.clone());
    }

    if keys.is_empty() {
        return None;
    }

    Some(BatchPrompt {
        direction,
        system: system_instruction(direction),
        user,
        keys,
        source_chars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn items(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn serializes_each_item_on_its_own_marker_line() {
        let d = Direction::new(Language::Ko, Language::En);
        let p = build(d, &items(&[("title", "안녕하세요"), ("goal", "목표")])).unwrap();

        assert!(p.system.contains("Korean text to English"));
        assert!(p.system.contains("ITEM_key: translated_text"));
        assert!(p.user.ends_with("ITEM_goal: 목표\nITEM_title: 안녕하세요\n"));
        assert_eq!(p.keys, vec!["goal", "title"]);
        assert_eq!(p.source_chars, 7);
    }

    #[test]
    fn empty_values_and_unusable_keys_are_left_out() {
        let d = Direction::new(Language::En, Language::Zh);
        let p = build(
            d,
            &items(&[("a", "  "), ("b:c", "text"), ("d", "Hello")]),
        )
        .unwrap();
        assert_eq!(p.keys, vec!["d"]);
        assert!(p.system.contains("Chinese (Simplified)"));
        assert!(!p.user.contains("ITEM_a"));
    }

    #[test]
    fn keys_with_edge_whitespace_are_left_out() {
        let d = Direction::new(Language::Ko, Language::En);
        let p = build(
            d,
            &items(&[(" title", "제목"), ("goal ", "목표"), ("due date", "마감일")]),
        )
        .unwrap();
        assert_eq!(p.keys, vec!["due date"]);
        assert_eq!(
            crate::translate::parser::parse("ITEM_due date: Due date", &p.keys)["due date"],
            "Due date"
        );
    }

    #[test]
    fn nothing_to_send_builds_nothing() {
        let d = Direction::new(Language::Ja, Language::Ko);
        assert!(build(d, &items(&[])).is_none());
        assert!(build(d, &items(&[("x", "")])).is_none());
    }

    #[test]
    fn max_tokens_estimate_is_capped() {
        let d = Direction::new(Language::Ko, Language::En);
        let p = build(d, &items(&[("t", "가나다")])).unwrap();
        assert_eq!(p.estimated_max_tokens(4096), 506);
        assert_eq!(p.estimated_max_tokens(100), 100);
    }
}
