//! SecretBackend port - one implementation per backend kind
//!
//! Resolution is split in two: `check` proves a secret is resolvable without
//! returning it, `resolve` returns the value and is only used when content is
//! actually delivered.

use crate::domain::entities::{BackendKind, SecretBackendConfig};
use crate::domain::value_objects::SecretValue;
use crate::error::EnvgateResult;

/// A secret to look up
#[derive(Debug, Clone, Copy)]
pub struct SecretRequest<'a> {
    pub env: &'a str,
    pub name: &'a str,
    pub config: &'a SecretBackendConfig,
}

/// A secret backend
///
/// Implementations may keep per-invocation state (e.g. identity caches),
/// hence `&mut self`.
pub trait SecretBackend {
    fn kind(&self) -> BackendKind;

    /// Verify the secret is resolvable
    fn check(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<()>;

    /// Fetch the secret value
    fn resolve(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<SecretValue>;
}
