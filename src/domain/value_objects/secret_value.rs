//! Secret Value
//!
//! A resolved secret. Deliberately has no `Display` or `Serialize` impl, and
//! its `Debug` output is redacted, so it cannot end up in logs or reports by
//! accident. Read it through [`SecretValue::expose`].

use std::fmt;

use super::REDACTED;

#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build from stored text, dropping surrounding whitespace and newlines
    pub fn from_stored(text: &str) -> Self {
        Self(text.trim().to_string())
    }

    /// The raw value; only for rendering delivered content
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue({})", REDACTED)
    }
}
