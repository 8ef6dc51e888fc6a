//! Error types for envgate
//!
//! Uses `thiserror` for library errors. Only the binary converts an error into
//! an exit code, so every fallible operation returns [`EnvgateResult`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for envgate operations
pub type EnvgateResult<T> = Result<T, EnvgateError>;

/// Main error type for envgate operations
#[derive(Error, Debug)]
pub enum EnvgateError {
    /// Malformed contract, policy, values or secret-reference document
    #[error("schema error at {path}: {message}")]
    SchemaValidation { path: String, message: String },

    /// Removed, out-of-scope or secret variable used where it is not allowed
    #[error("{key}: {message}")]
    ScopeOrLifecycle { key: String, message: String },

    /// Two or more rules tie at the highest specificity
    #[error("ambiguous {rule_set} rules at specificity {specificity}: {}", rules.join(", "))]
    PolicyAmbiguity {
        rule_set: String,
        specificity: usize,
        rules: Vec<String>,
    },

    /// A secret reference could not be resolved
    #[error("secret '{secret}' is not resolvable: {message}")]
    SecretResolution { secret: String, message: String },

    /// A subprocess, ssh or sudo step failed
    #[error("{operation} failed on {host}: {message}")]
    Transport {
        operation: String,
        host: String,
        message: String,
    },

    /// Health check never reported success
    #[error("health check for {url} failed: {message}")]
    Healthcheck { url: String, message: String },

    /// A required approval flag was not supplied
    #[error("refusing to continue without {flag}")]
    Approval { flag: String },

    /// Preflight found credential signals forbidden by the auth posture
    #[error("preflight failed: {message}")]
    Preflight { message: String },

    /// Delivered content no longer matches the recorded hash
    #[error("verification failed: {message}")]
    Verification { message: String },

    /// Operation not supported by the selected provider
    #[error("{operation} is not supported for provider '{provider}'")]
    Unsupported { operation: String, provider: String },

    /// Persisted deployed record is unreadable
    #[error("corrupted deployed state at {path}: {message}")]
    CorruptedState { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EnvgateError {
    /// Shorthand for a schema error at a dotted field path
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a lifecycle or scope misuse of a variable key
    pub fn lifecycle(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScopeOrLifecycle {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an unresolvable secret reference
    pub fn secret(secret: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SecretResolution {
            secret: secret.into(),
            message: message.into(),
        }
    }
}
