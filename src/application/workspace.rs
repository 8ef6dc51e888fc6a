//! Project workspace
//!
//! Binds a project root to its configuration, the state repository and the
//! subprocess runner, and loads the documents of one environment into a
//! [`DesiredState`]. Every use case starts here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Config;
use crate::domain::entities::{
    parse_secret_refs, Contract, ContractDocument, DesiredState, SecretRefsDocument,
};
use crate::domain::policies::{Policy, PolicyDocument};
use crate::domain::ports::CommandRunner;
use crate::domain::services::{build_desired_state, BuildInputs};
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::fs::expand_home;
use crate::infrastructure::{
    read_document, EnvLock, JsonStateRepository, ResolverContext, SecretResolver,
    SystemCommandRunner,
};

/// Everything loaded for one environment
#[derive(Debug, Clone)]
pub struct EnvContext {
    pub policy: Policy,
    pub desired: DesiredState,
}

pub struct Workspace {
    root: PathBuf,
    config: Config,
    process_env: BTreeMap<String, String>,
    runner: Box<dyn CommandRunner>,
    states: JsonStateRepository,
}

impl Workspace {
    /// Workspace over the real process environment and subprocesses
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let states = JsonStateRepository::new(config.state_dir(&root));
        Self {
            root,
            config,
            process_env: std::env::vars().collect(),
            runner: Box::new(SystemCommandRunner::new()),
            states,
        }
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_process_env(mut self, process_env: BTreeMap<String, String>) -> Self {
        self.process_env = process_env;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn states(&self) -> &JsonStateRepository {
        &self.states
    }

    pub fn state_dir(&self) -> &Path {
        self.states.state_dir()
    }

    /// Take the per-environment lock held by mutating operations
    pub fn lock(&self, desired: &DesiredState) -> EnvgateResult<EnvLock> {
        self.states.lock(desired.provider, &desired.env)
    }

    /// Load `policy.yaml`; a missing file means the built-in defaults
    pub fn load_policy(&self) -> EnvgateResult<Policy> {
        let path = self.config.policy_path(&self.root);
        match read_document::<PolicyDocument>(&path, "policy.yaml", "")? {
            Some(doc) => Policy::from_document(doc),
            None => {
                tracing::debug!(path = %path.display(), "no policy file, using defaults");
                Ok(Policy::default())
            }
        }
    }

    pub fn load_contract(&self) -> EnvgateResult<Contract> {
        let path = self.config.contract_path(&self.root);
        let doc = read_document::<ContractDocument>(&path, "contract.yaml", "")?.ok_or_else(
            || EnvgateError::schema("contract.yaml", format!("not found at {}", path.display())),
        )?;
        Contract::from_document(doc)
    }

    /// Load and merge every document of `env`
    pub fn load_env(&self, env: &str, workload: Option<&str>) -> EnvgateResult<EnvContext> {
        validate_env_name(env)?;
        let contract = self.load_contract()?;
        let policy = self.load_policy()?;

        let values_name = format!("values/{}.yaml", env);
        let values: BTreeMap<String, Value> =
            read_document(&self.config.values_path(&self.root, env), &values_name, "values")?
                .unwrap_or_default();

        let secrets_name = format!("secrets/{}.yaml", env);
        let secret_refs = read_document::<SecretRefsDocument>(
            &self.config.secrets_path(&self.root, env),
            &secrets_name,
            "secrets",
        )?
        .map(parse_secret_refs)
        .transpose()?
        .unwrap_or_default();

        let file_exists = |path: &str| expand_home(path).exists();
        let desired = build_desired_state(&BuildInputs {
            env,
            workload,
            contract: &contract,
            values: &values,
            secret_refs: &secret_refs,
            policy: &policy,
            env_selector: &self.config.contract.env_selector,
            file_exists: &file_exists,
        })?;

        for warning in &desired.warnings {
            tracing::warn!("{}", warning);
        }
        Ok(EnvContext { policy, desired })
    }

    /// A resolver with the standard backends, for one invocation
    pub fn resolver(&self, policy: &Policy) -> SecretResolver<'_> {
        SecretResolver::standard(ResolverContext {
            root: self.root.clone(),
            state_dir: self.state_dir().to_path_buf(),
            process_env: self.process_env.clone(),
            bws: policy.bws().clone(),
            runner: self.runner(),
        })
    }
}

/// Environment names end up in file paths
pub fn validate_env_name(env: &str) -> EnvgateResult<()> {
    let mut chars = env.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !env.contains("..");
    if valid {
        Ok(())
    } else {
        Err(EnvgateError::schema(
            "env",
            format!("invalid environment name '{}'", env),
        ))
    }
}
