//! Clipboard content handling: redaction, truncation, digests, classification

pub mod classify;
pub mod hasher;
pub mod sanitizer;

pub use classify::classify;
pub use hasher::content_hash;
pub use sanitizer::{REDACTED, Sanitizer};
