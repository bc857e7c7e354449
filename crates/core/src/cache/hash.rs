//! Request identity key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request from its method and URL.
///
/// The method is uppercased so `get` and `GET` address the same entry.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check that a string looks like a key produced by [`compute_cache_key`].
pub fn is_valid_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/about.html");
        let hash2 = compute_cache_key("GET", "https://example.com/about.html");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", "https://example.com/"),
            compute_cache_key("GET", "https://example.com/")
        );
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://example.com/contact");
        let post = compute_cache_key("POST", "https://example.com/contact");
        assert_ne!(get, post);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com");
        assert!(is_valid_key(&hash));
        assert!(!is_valid_key("abc"));
        assert!(!is_valid_key(&"z".repeat(64)));
    }
}
