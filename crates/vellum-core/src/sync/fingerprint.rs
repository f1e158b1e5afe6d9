//! Content fingerprinting
//!
//! Cheap equality checks between local and remote article bodies without
//! shipping the full text around.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 fingerprint of the given content
#[must_use]
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}
