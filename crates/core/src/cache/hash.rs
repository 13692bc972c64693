//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a canonical source URL.
///
/// Callers are expected to canonicalize first; the key is a plain SHA-256 over
/// whatever string they pass, so two spellings of the same page only share a
/// key once they have been normalized to the same text.
pub fn compute_cache_key(canonical_url: &str) -> String {
    sha256_hex(canonical_url)
}

/// Hash of the Markdown body, used to tell whether a refetch changed anything.
pub fn compute_content_hash(markdown: &str) -> String {
    sha256_hex(markdown)
}

/// Whether `s` has the shape of a key produced by [`compute_cache_key`].
pub fn is_cache_key(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_digit() || matches!(c, 'a'..='f'))
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("https://example.com/");
        let hash2 = compute_cache_key("https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_urls() {
        let hash1 = compute_cache_key("https://example.com/a");
        let hash2 = compute_cache_key("https://example.com/b");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(is_cache_key(&hash));
    }

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            compute_content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_is_cache_key_rejects() {
        assert!(!is_cache_key("abc"));
        assert!(!is_cache_key(&"G".repeat(64)));
        assert!(!is_cache_key(&"A".repeat(64)));
        assert!(is_cache_key(&"a".repeat(64)));
    }
}
