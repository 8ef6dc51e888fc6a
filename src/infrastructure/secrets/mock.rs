//! `mock` backend - one trimmed text file per secret under the state directory

use std::path::{Path, PathBuf};

use crate::domain::entities::BackendKind;
use crate::domain::ports::{SecretBackend, SecretRequest};
use crate::domain::value_objects::{Provider, SecretValue};
use crate::error::{EnvgateError, EnvgateResult};

/// `<state>/mockcloud/<env>/secrets/<name>`
pub fn mock_secret_path(state_dir: &Path, env: &str, name: &str) -> PathBuf {
    state_dir
        .join(Provider::MockCloud.as_str())
        .join(env)
        .join("secrets")
        .join(name)
}

pub struct MockBackend {
    state_dir: PathBuf,
}

impl MockBackend {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    fn existing_path(&self, request: &SecretRequest<'_>) -> EnvgateResult<PathBuf> {
        let path = mock_secret_path(&self.state_dir, request.env, request.name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(EnvgateError::secret(
                request.name,
                format!("mock secret missing: create {}", path.display()),
            ))
        }
    }
}

impl SecretBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mock
    }

    fn check(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<()> {
        self.existing_path(request).map(|_| ())
    }

    fn resolve(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<SecretValue> {
        let path = self.existing_path(request)?;
        let text = std::fs::read_to_string(&path)?;
        Ok(SecretValue::from_stored(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SecretBackendConfig;

    #[test]
    fn resolves_trimmed_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = mock_secret_path(dir.path(), "dev", "db_password");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "  s3cret\n").unwrap();

        let mut backend = MockBackend::new(dir.path());
        let request = SecretRequest {
            env: "dev",
            name: "db_password",
            config: &SecretBackendConfig::Mock,
        };
        backend.check(&request).unwrap();
        assert_eq!(backend.resolve(&request).unwrap().expose(), "s3cret");
    }

    #[test]
    fn missing_file_names_the_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new(dir.path());
        let err = backend
            .check(&SecretRequest {
                env: "dev",
                name: "db_password",
                config: &SecretBackendConfig::Mock,
            })
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("mock secret missing"));
        assert!(text.contains("mockcloud/dev/secrets/db_password"));
    }
}
