//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::services::DEFAULT_ENV_SELECTOR;
use crate::error::EnvgateResult;
use crate::infrastructure::transport::HealthcheckTiming;

use super::loader::{self, ConfigWarning};

/// Where the input documents and the state directory live, relative to the
/// project root unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub contract: PathBuf,
    pub values_dir: PathBuf,
    pub secrets_dir: PathBuf,
    pub policy: PathBuf,
    pub state_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            contract: PathBuf::from("contract.yaml"),
            values_dir: PathBuf::from("values"),
            secrets_dir: PathBuf::from("secrets"),
            policy: PathBuf::from("policy.yaml"),
            state_dir: PathBuf::from(".envgate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Variable forced to the environment name
    pub env_selector: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            env_selector: DEFAULT_ENV_SELECTOR.to_string(),
        }
    }
}

/// Fallback timing for targets whose health check sets none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcheckConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        let timing = HealthcheckTiming::default();
        Self {
            interval_secs: timing.interval_secs,
            timeout_secs: timing.timeout_secs,
        }
    }
}

impl HealthcheckConfig {
    pub fn timing(&self) -> HealthcheckTiming {
        HealthcheckTiming {
            interval_secs: self.interval_secs,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Contents of `envgate.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub contract: ContractConfig,
    pub healthcheck: HealthcheckConfig,
}

impl Config {
    /// Load a config file, returning unknown keys as warnings
    pub fn load_with_warnings(path: &Path) -> EnvgateResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load `envgate.toml` from `root` (or `explicit`), falling back to defaults
    pub fn discover(
        root: &Path,
        explicit: Option<&Path>,
    ) -> EnvgateResult<(Self, Vec<ConfigWarning>)> {
        loader::discover(root, explicit)
    }

    pub fn contract_path(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.contract)
    }

    pub fn values_path(&self, root: &Path, env: &str) -> PathBuf {
        root.join(&self.paths.values_dir).join(format!("{}.yaml", env))
    }

    pub fn secrets_path(&self, root: &Path, env: &str) -> PathBuf {
        root.join(&self.paths.secrets_dir).join(format!("{}.yaml", env))
    }

    pub fn policy_path(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.policy)
    }

    pub fn state_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.state_dir)
    }
}
