//! `file` backend - a trimmed text file, absolute or relative to the project root

use std::path::PathBuf;

use crate::domain::entities::{BackendKind, SecretBackendConfig};
use crate::domain::ports::{SecretBackend, SecretRequest};
use crate::domain::value_objects::SecretValue;
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::fs::resolve_against;

pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn existing_path(&self, request: &SecretRequest<'_>) -> EnvgateResult<PathBuf> {
        let SecretBackendConfig::File { path } = request.config else {
            return Err(EnvgateError::secret(request.name, "not a file backend reference"));
        };
        let path = resolve_against(&self.root, &path.to_string_lossy());
        if path.is_file() {
            Ok(path)
        } else {
            Err(EnvgateError::secret(
                request.name,
                format!("file secret missing: {}", path.display()),
            ))
        }
    }
}

impl SecretBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn check(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<()> {
        self.existing_path(request).map(|_| ())
    }

    fn resolve(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<SecretValue> {
        let path = self.existing_path(request)?;
        Ok(SecretValue::from_stored(&std::fs::read_to_string(path)?))
    }
}
