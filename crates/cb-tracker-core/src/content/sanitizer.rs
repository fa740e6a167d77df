//! Redaction and truncation of clipboard text before it leaves the process

use crate::config::{ContentConfig, TRUNCATION_MARKER};
use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for every sensitive match
pub const REDACTED: &str = "[REDACTED]";

// Applied in order; the long-token rule runs last so it cannot eat a
// replacement produced by an earlier rule.
static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)password\s*[:=]\s*\S+",
        r"(?i)api[_-]?key\s*[:=]\s*\S+",
        r"(?i)token\s*[:=]\s*\S+",
        r"(?i)secret\s*[:=]\s*\S+",
        r"(?i)auth\s*[:=]\s*\S+",
        r"(?i)bearer\s+\S+",
        r"[a-zA-Z0-9]{32,}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static redaction pattern"))
    .collect()
});

/// Sanitizes and caps clipboard text
#[derive(Debug, Clone)]
pub struct Sanitizer {
    preview_chars: usize,
    storage_chars: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&ContentConfig::default())
    }
}

impl Sanitizer {
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            preview_chars: config.preview_chars,
            storage_chars: config.storage_chars,
        }
    }

    /// Replace credential-looking substrings with [`REDACTED`]
    pub fn redact(content: &str) -> String {
        SENSITIVE_PATTERNS
            .iter()
            .fold(content.to_string(), |text, pattern| {
                pattern.replace_all(&text, REDACTED).into_owned()
            })
    }

    /// Cut `content` to at most `max_chars` characters, marker included
    pub fn limit(content: &str, max_chars: usize) -> String {
        if content.chars().count() <= max_chars {
            return content.to_string();
        }
        let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
        let mut limited: String = content.chars().take(keep).collect();
        limited.push_str(TRUNCATION_MARKER);
        limited
    }

    /// Redacted content capped at the storage limit
    pub fn stored(&self, raw: &str) -> String {
        Self::limit(&Self::redact(raw), self.storage_chars)
    }

    /// Redacted single-line preview capped at the preview limit
    pub fn preview(&self, raw: &str) -> String {
        Self::limit(&Self::redact(raw), self.preview_chars)
            .replace('\n', " ")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_redacted() {
        let out = Sanitizer::redact("db config\npassword: abc123\nhost: x");
        assert!(out.contains(REDACTED));
        assert!(!out.contains("abc123"));
        assert!(out.contains("host: x"));
    }

    #[test]
    fn test_credential_variants() {
        for input in [
            "API_KEY=sk-live-1",
            "api-key: sk-live-1",
            "Token = sk-live-1",
            "secret:sk-live-1",
            "auth=sk-live-1",
            "Authorization: Bearer sk-live-1",
        ] {
            let out = Sanitizer::redact(input);
            assert!(!out.contains("sk-live-1"), "leaked in {:?} -> {:?}", input, out);
        }
    }

    #[test]
    fn test_long_opaque_token_redacted() {
        let token = "a1B2c3D4e5F6g7H8i9J0k1L2m3N4o5P6q7";
        assert!(token.len() >= 32);
        let out = Sanitizer::redact(&format!("key {} end", token));
        assert_eq!(out, format!("key {} end", REDACTED));

        let short = "abcdefghijklmnopqrstuvwxyz01234"; // 31 chars
        assert_eq!(Sanitizer::redact(short), short);
    }

    #[test]
    fn test_limit_respects_cap_with_marker() {
        let long = "x".repeat(2000);
        let limited = Sanitizer::limit(&long, 1000);
        assert_eq!(limited.chars().count(), 1000);
        assert!(limited.ends_with(TRUNCATION_MARKER));

        assert_eq!(Sanitizer::limit("short", 1000), "short");
    }

    #[test]
    fn test_limit_is_char_boundary_safe() {
        let text = "é".repeat(50);
        let limited = Sanitizer::limit(&text, 20);
        assert_eq!(limited.chars().count(), 20);
    }

    #[test]
    fn test_preview_single_line() {
        let sanitizer = Sanitizer::default();
        let preview = sanitizer.preview("  line one\nline two\n");
        assert_eq!(preview, "line one line two");
    }

    #[test]
    fn test_stored_never_contains_secret() {
        let sanitizer = Sanitizer::default();
        let stored = sanitizer.stored("password: abc123");
        assert_eq!(stored, REDACTED);
    }
}
