// Utility functions for relevance-service

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a message body
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// True when the value is empty or whitespace only
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
