//! `env` backend - a variable of the process environment

use std::collections::BTreeMap;

use crate::domain::entities::{BackendKind, SecretBackendConfig};
use crate::domain::ports::{SecretBackend, SecretRequest};
use crate::domain::value_objects::SecretValue;
use crate::error::{EnvgateError, EnvgateResult};

pub struct EnvBackend {
    vars: BTreeMap<String, String>,
}

impl EnvBackend {
    /// Backend over a snapshot of environment variables
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    fn lookup(&self, request: &SecretRequest<'_>) -> EnvgateResult<&str> {
        let SecretBackendConfig::Env { env_var } = request.config else {
            return Err(EnvgateError::secret(request.name, "not an env backend reference"));
        };
        self.vars.get(env_var).map(String::as_str).ok_or_else(|| {
            EnvgateError::secret(
                request.name,
                format!("missing environment variable for secret backend env: {}", env_var),
            )
        })
    }
}

impl SecretBackend for EnvBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Env
    }

    fn check(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<()> {
        self.lookup(request).map(|_| ())
    }

    fn resolve(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<SecretValue> {
        self.lookup(request).map(SecretValue::new)
    }
}
