//! Short deterministic content digests

use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest
pub const HASH_PREFIX_LEN: usize = 8;

/// First eight hex characters of the SHA-256 of `content`
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = String::with_capacity(HASH_PREFIX_LEN);
    for byte in digest.iter().take(HASH_PREFIX_LEN / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest_prefix() {
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(content_hash("hello"), "2cf24dba");
        // sha256("") = e3b0c442...
        assert_eq!(content_hash(""), "e3b0c442");
    }

    #[test]
    fn test_hash_is_deterministic_and_distinguishing() {
        assert_eq!(content_hash("print(x)"), content_hash("print(x)"));
        assert_ne!(content_hash("print(x)"), content_hash("print(y)"));
        assert_eq!(content_hash("anything").len(), HASH_PREFIX_LEN);
    }
}
