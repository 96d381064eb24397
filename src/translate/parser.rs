//! Tolerant reply parsing.
//!
//! The provider is asked for `ITEM_<key>: <value>` lines but does not always
//! comply. Each line is offered to an ordered chain of strategies:
//!
//! 1. `MarkerStrategy`: `ITEM_key: value`. Following lines are appended to
//!    the value (multi-line translations) until a blank line, another
//!    strategy match, or any line starting with the marker.
//! 2. `LooseStrategy`: plain `key: value`, key matched case-insensitively
//!    against the expected keys. Single line only.
//!
//! A line no strategy claims is skipped. A blank line closes the open item, so
//! closing chatter after an empty line is never glued onto the last value.
//! A marker line that does not parse closes the open item and is dropped.
//! The result only ever holds expected keys with non-empty values; partial
//! replies yield partial maps.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use super::prompt::ITEM_MARKER;

/// A line that opens a new item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// Expected key this line resolved to; `None` for a marker naming an
    /// unknown key (its continuation lines are swallowed, not misattributed).
    pub key: Option<String>,
    pub value: String,
    /// Whether following unclaimed lines belong to this item.
    pub continues: bool,
}

pub trait LineStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn match_line(&self, line: &str, expected: &[String]) -> Option<LineMatch>;
}

fn resolve_key(candidate: &str, expected: &[String]) -> Option<String> {
    expected
        .iter()
        .find(|k| k.as_str() == candidate)
        .or_else(|| expected.iter().find(|k| k.eq_ignore_ascii_case(candidate)))
        .cloned()
}

pub struct MarkerStrategy;

impl MarkerStrategy {
    fn pattern() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            let src = format!(r"^(?:[-*]\s+)?{ITEM_MARKER}([^:：]+?)\s*[:：]\s*(.*)$");
            Regex::new(&src).expect("marker pattern is valid")
        })
    }
}

impl LineStrategy for MarkerStrategy {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn match_line(&self, line: &str, expected: &[String]) -> Option<LineMatch> {
        let caps = Self::pattern().captures(line)?;
        let candidate = caps.get(1)?.as_str().trim();
        let key = resolve_key(candidate, expected);
        if key.is_none() {
            warn!(key = candidate, "reply names an item that was not requested");
        }
        Some(LineMatch {
            key,
            value: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            continues: true,
        })
    }
}

pub struct LooseStrategy;

impl LooseStrategy {
    fn pattern() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r"^(?:[-*]\s+)?([^:：]+?)\s*[:：]\s*(.*)$").expect("loose pattern is valid")
        })
    }
}

impl LineStrategy for LooseStrategy {
    fn name(&self) -> &'static str {
        "loose"
    }

    fn match_line(&self, line: &str, expected: &[String]) -> Option<LineMatch> {
        let caps = Self::pattern().captures(line)?;
        let key = resolve_key(caps.get(1)?.as_str().trim(), expected)?;
        Some(LineMatch {
            key: Some(key),
            value: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            continues: false,
        })
    }
}

/// Whether `line`, past an optional list bullet, starts with the item marker.
fn starts_with_marker(line: &str) -> bool {
    line.strip_prefix(['-', '*'])
        .map_or(line, str::trim_start)
        .starts_with(ITEM_MARKER)
}

struct OpenItem {
    key: Option<String>,
    lines: Vec<String>,
    continues: bool,
}

impl OpenItem {
    fn close(self, into: &mut BTreeMap<String, String>) {
        let Some(key) = self.key else { return };
        let value = self.lines.join("\n");
        let value = value.trim();
        if value.is_empty() {
            debug!(key = %key, "item had no value, dropped");
            return;
        }
        into.insert(key, value.to_string());
    }
}

/// Ordered chain of line strategies.
pub struct ResponseParser {
    strategies: Vec<Box<dyn LineStrategy>>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(vec![Box::new(MarkerStrategy), Box::new(LooseStrategy)])
    }
}

impl ResponseParser {
    pub fn new(strategies: Vec<Box<dyn LineStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extract `key -> translation` for `expected` keys from a raw reply.
    pub fn parse(&self, raw: &str, expected: &[String]) -> BTreeMap<String, String> {
        let mut parsed = BTreeMap::new();
        let mut open: Option<OpenItem> = None;

        for raw_line in raw.lines() {
            let line = raw_line.trim();
            if line.starts_with("```") {
                continue;
            }

            let claimed = self
                .strategies
                .iter()
                .find_map(|s| s.match_line(line, expected).map(|m| (s.name(), m)));

            match claimed {
                Some((strategy, m)) => {
                    if let Some(item) = open.take() {
                        item.close(&mut parsed);
                    }
                    debug!(strategy, key = ?m.key, "reply line matched");
                    open = Some(OpenItem {
                        key: m.key,
                        lines: vec![m.value],
                        continues: m.continues,
                    });
                }
                None if line.is_empty() => {
                    if let Some(item) = open.take() {
                        item.close(&mut parsed);
                    }
                }
                None if starts_with_marker(line) => {
                    if let Some(item) = open.take() {
                        item.close(&mut parsed);
                    }
                    warn!(line, "malformed item line skipped");
                }
                None => match open.as_mut() {
                    Some(item) if item.continues => item.lines.push(line.to_string()),
                    _ => debug!(line, "unparseable reply line skipped"),
                },
            }
        }
        if let Some(item) = open.take() {
            item.close(&mut parsed);
        }

        info!(requested = expected.len(), parsed = parsed.len(), "reply parsed");
        if parsed.len() < expected.len() {
            let missing: Vec<&str> = expected
                .iter()
                .filter(|k| !parsed.contains_key(*k))
                .map(String::as_str)
                .collect();
            warn!(?missing, "some items missing from reply");
        }
        parsed
    }
}

/// Parse with the default strategy chain.
pub fn parse(raw: &str, expected: &[String]) -> BTreeMap<String, String> {
    ResponseParser::default().parse(raw, expected)
}
