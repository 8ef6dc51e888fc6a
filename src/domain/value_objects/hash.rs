//! Content Hash Value Object
//!
//! A SHA-256 digest of delivered env-file content.
//! Used for drift detection against the deployed record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content hash value object
///
/// Stores the lowercase hex digest. `Display` renders it with the `sha256:`
/// prefix, while the deployed record stores the bare hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Prefix for SHA-256 hashes
    pub const PREFIX: &'static str = "sha256:";

    /// Create a ContentHash from a hex digest (with or without prefix)
    pub fn new(raw_hash: &str) -> Self {
        let hex = raw_hash.strip_prefix(Self::PREFIX).unwrap_or(raw_hash);
        Self(hex.trim().to_ascii_lowercase())
    }

    /// Create a ContentHash by computing SHA-256 of content
    pub fn from_bytes(content: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        Self(format!("{:x}", Sha256::digest(content)))
    }

    /// Get just the hex part without prefix
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// Check if this hash matches a raw string (with or without prefix)
    pub fn matches_str(&self, s: &str) -> bool {
        *self == Self::new(s)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
