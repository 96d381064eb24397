//! Content-addressed cache keys.
//! Key: `<prefix>:<direction tag>:<blake3 hex of (tag | text)>`.
//! The direction segment lets an operator clear one direction by prefix.

use crate::language::Direction;

/// Compute the cache key for a source text translated in `direction`.
/// Read and write paths must both go through here.
pub fn cache_key(prefix: &str, text: &str, direction: Direction) -> String {
    let tag = direction.tag();
    let mut hasher = blake3::Hasher::new();
    hasher.update(tag.as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    format!("{}{}", direction_prefix(prefix, direction), hasher.finalize().to_hex())
}

/// Prefix shared by every key of one direction.
pub fn direction_prefix(prefix: &str, direction: Direction) -> String {
    format!("{prefix}:{}:", direction.tag())
}

/// Prefix shared by every translation key.
pub fn namespace_prefix(prefix: &str) -> String {
    format!("{prefix}:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    const KO_EN: Direction = Direction {
        from: Language::Ko,
        to: Language::En,
    };

    #[test]
    fn key_is_deterministic_and_fixed_length() {
        let a = cache_key("translation", "안녕하세요", KO_EN);
        let b = cache_key("translation", "안녕하세요", KO_EN);
        let c = cache_key("translation", "a much longer piece of text entirely", KO_EN);
        assert_eq!(a, b);
        assert_eq!(a.len(), c.len());
        assert!(a.starts_with("translation:ko_to_en:"));
    }

    #[test]
    fn direction_changes_the_key() {
        let en_ko = Direction::new(Language::En, Language::Ko);
        assert_ne!(
            cache_key("translation", "hello", KO_EN),
            cache_key("translation", "hello", en_ko)
        );
    }

    #[test]
    fn whitespace_is_significant() {
        assert_ne!(
            cache_key("translation", "목표", KO_EN),
            cache_key("translation", "목표 ", KO_EN)
        );
    }
}
