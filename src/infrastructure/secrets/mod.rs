//! Secret Backend Resolver
//!
//! A lookup table of [`SecretBackend`] implementations keyed by backend
//! kind. One resolver lives for one invocation, so per-backend caches (bws
//! identities) are shared by every lookup of that invocation and no longer.

mod bws;
mod env;
mod file;
mod mock;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

pub use bws::BwsBackend;
pub use env::EnvBackend;
pub use file::FileBackend;
pub use mock::{mock_secret_path, MockBackend};

use crate::domain::entities::{BackendKind, DesiredState, SecretBackendConfig};
use crate::domain::policies::BwsSettings;
use crate::domain::ports::{CommandRunner, SecretBackend, SecretRequest};
use crate::domain::value_objects::SecretValue;
use crate::error::{EnvgateError, EnvgateResult};

/// What the standard backends need to know
pub struct ResolverContext<'r> {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    /// Snapshot of the process environment
    pub process_env: BTreeMap<String, String>,
    pub bws: BwsSettings,
    pub runner: &'r dyn CommandRunner,
}

/// Outcome of checking one secret without fetching it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretStatus {
    pub secret: String,
    pub backend: BackendKind,
    pub stable_ref: String,
    /// `None` when resolvable
    pub problem: Option<String>,
}

#[derive(Default)]
pub struct SecretResolver<'r> {
    backends: BTreeMap<BackendKind, Box<dyn SecretBackend + 'r>>,
}

impl<'r> SecretResolver<'r> {
    pub fn new() -> Self {
        Self {
            backends: BTreeMap::new(),
        }
    }

    /// Resolver with the mock, env, file and bws backends registered
    pub fn standard(ctx: ResolverContext<'r>) -> Self {
        let token_present = ctx
            .process_env
            .get(&ctx.bws.access_token_env)
            .is_some_and(|t| !t.trim().is_empty());

        let mut resolver = Self::new();
        resolver.register(Box::new(MockBackend::new(ctx.state_dir)));
        resolver.register(Box::new(EnvBackend::new(ctx.process_env)));
        resolver.register(Box::new(FileBackend::new(ctx.root)));
        resolver.register(Box::new(BwsBackend::new(ctx.runner, ctx.bws, token_present)));
        resolver
    }

    /// Register a backend, replacing any previous one of the same kind
    pub fn register(&mut self, backend: Box<dyn SecretBackend + 'r>) {
        self.backends.insert(backend.kind(), backend);
    }

    fn backend(
        &mut self,
        name: &str,
        config: &SecretBackendConfig,
    ) -> EnvgateResult<&mut (dyn SecretBackend + 'r)> {
        let kind = config.kind();
        match self.backends.get_mut(&kind) {
            Some(backend) => Ok(backend.as_mut()),
            None => Err(EnvgateError::secret(
                name,
                format!("no backend registered for '{}'", kind),
            )),
        }
    }

    /// Verify one secret is resolvable
    pub fn check(&mut self, env: &str, name: &str, config: &SecretBackendConfig) -> EnvgateResult<()> {
        let request = SecretRequest { env, name, config };
        self.backend(name, config)?.check(&request)
    }

    /// Fetch one secret value
    pub fn resolve(
        &mut self,
        env: &str,
        name: &str,
        config: &SecretBackendConfig,
    ) -> EnvgateResult<SecretValue> {
        let request = SecretRequest { env, name, config };
        self.backend(name, config)?.resolve(&request)
    }

    /// Verify every secret of a desired state, failing on the first problem
    pub fn check_all(&mut self, desired: &DesiredState) -> EnvgateResult<()> {
        for (name, config) in &desired.secret_backends {
            self.check(&desired.env, name, config)?;
        }
        Ok(())
    }

    /// Fetch every secret of a desired state
    pub fn resolve_all(&mut self, desired: &DesiredState) -> EnvgateResult<BTreeMap<String, SecretValue>> {
        let mut values = BTreeMap::new();
        for (name, config) in &desired.secret_backends {
            let value = self.resolve(&desired.env, name, config)?;
            values.insert(name.clone(), value);
        }
        tracing::debug!(count = values.len(), env = %desired.env, "resolved secrets");
        Ok(values)
    }

    /// Check every secret, collecting problems instead of failing
    pub fn report_all(&mut self, desired: &DesiredState) -> Vec<SecretStatus> {
        desired
            .secret_backends
            .iter()
            .map(|(name, config)| SecretStatus {
                secret: name.clone(),
                backend: config.kind(),
                stable_ref: config.stable_ref(name, &desired.env),
                problem: self
                    .check(&desired.env, name, config)
                    .err()
                    .map(|e| problem_text(&e)),
            })
            .collect()
    }
}

/// Error text without the `secret '<name>' is not resolvable:` preamble
fn problem_text(err: &EnvgateError) -> String {
    match err {
        EnvgateError::SecretResolution { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
