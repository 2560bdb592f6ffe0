//! Content-addressed keys for detailed game statistics.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A deterministic cache key derived from a stats reference.
///
/// Two sessions (or two processes) hashing the same reference always land on
/// the same key, so a blob fetched once stays addressable for the whole
/// session regardless of which panel asked for it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsKey(String);

impl StatsKey {
    /// Wrap an already-computed hash string.
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Generate a key from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();
        let hash = hex::encode(result);
        Self(hash[..16].to_string())
    }

    /// Key for the stats blob behind a match's `stats_ref`.
    pub fn for_stats_ref(stats_ref: &str) -> Self {
        Self::generate(&["game-stats", stats_ref.trim()])
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatsKey({})", self.0)
    }
}

impl From<&str> for StatsKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_key_deterministic() {
        let k1 = StatsKey::for_stats_ref("4f1c9e0a-dm3-2026-03-01");
        let k2 = StatsKey::for_stats_ref("4f1c9e0a-dm3-2026-03-01");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_stats_key_ignores_surrounding_whitespace() {
        assert_eq!(
            StatsKey::for_stats_ref(" abc "),
            StatsKey::for_stats_ref("abc")
        );
    }

    #[test]
    fn test_stats_key_different_refs() {
        assert_ne!(
            StatsKey::for_stats_ref("game-1"),
            StatsKey::for_stats_ref("game-2")
        );
    }

    #[test]
    fn test_stats_key_length_and_hex() {
        let key = StatsKey::for_stats_ref("anything");
        assert_eq!(key.as_str().len(), 16);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_stats_key_debug() {
        let key = StatsKey::from("abc123");
        assert_eq!(format!("{:?}", key), "StatsKey(abc123)");
        assert_eq!(format!("{}", key), "abc123");
    }
}
