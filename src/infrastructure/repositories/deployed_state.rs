//! JSON Deployed-State Repository
//!
//! Persists one record per environment at
//! `<state>/<provider>/<env>/deployed.json`. Mutating use cases hold an
//! exclusive advisory lock on `<state>/<provider>/<env>/.lock` for their whole
//! duration via [`JsonStateRepository::lock`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::entities::{DeployedState, RECORD_VERSION};
use crate::domain::ports::StateRepository;
use crate::domain::value_objects::Provider;
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::fs::LocalFs;

const RECORD_FILE: &str = "deployed.json";
const LOCK_FILE: &str = ".lock";

pub struct JsonStateRepository {
    state_dir: PathBuf,
}

/// Held exclusive lock of one environment; released on drop
#[derive(Debug)]
pub struct EnvLock {
    file: fs::File,
}

impl Drop for EnvLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl JsonStateRepository {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// `<state>/<provider>/<env>`
    pub fn env_dir(&self, provider: Provider, env: &str) -> PathBuf {
        self.state_dir.join(provider.as_str()).join(env)
    }

    pub fn record_path(&self, provider: Provider, env: &str) -> PathBuf {
        self.env_dir(provider, env).join(RECORD_FILE)
    }

    /// Take the exclusive lock of an environment, blocking until it is free
    pub fn lock(&self, provider: Provider, env: &str) -> EnvgateResult<EnvLock> {
        let dir = self.env_dir(provider, env);
        fs::create_dir_all(&dir)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        tracing::debug!(provider = %provider, env, "acquired environment lock");
        Ok(EnvLock { file })
    }
}

impl StateRepository for JsonStateRepository {
    fn load(&self, provider: Provider, env: &str) -> EnvgateResult<Option<DeployedState>> {
        let path = self.record_path(provider, env);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: DeployedState =
            serde_json::from_str(&content).map_err(|e| EnvgateError::CorruptedState {
                path: path.clone(),
                message: e.to_string(),
            })?;
        if record.record_version != RECORD_VERSION {
            return Err(EnvgateError::CorruptedState {
                path,
                message: format!(
                    "unsupported record version {} (expected {})",
                    record.record_version, RECORD_VERSION
                ),
            });
        }
        if record.env != env || record.provider != provider {
            return Err(EnvgateError::CorruptedState {
                path,
                message: format!(
                    "record belongs to {}/{}",
                    record.provider, record.env
                ),
            });
        }
        Ok(Some(record))
    }

    fn save(&self, state: &DeployedState) -> EnvgateResult<()> {
        let path = self.record_path(state.provider, &state.env);
        let mut content = serde_json::to_string_pretty(state)?;
        content.push('\n');
        LocalFs::new().write_atomic(&path, content.as_bytes(), 0o600)?;
        tracing::debug!(path = %path.display(), "saved deployed record");
        Ok(())
    }

    fn delete(&self, provider: Provider, env: &str) -> EnvgateResult<bool> {
        Ok(LocalFs::new().remove_if_exists(&self.record_path(provider, env))?)
    }
}
