//! Decommission Use Case
//!
//! Mockcloud only: deletes the deployed record of an environment. Absence of
//! a record is success. Mock secret backing files are left alone.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::ports::StateRepository;
use crate::domain::value_objects::Provider;
use crate::error::{EnvgateError, EnvgateResult};

use super::workspace::{validate_env_name, Workspace};

#[derive(Debug, Clone, Default)]
pub struct DecommissionOptions {
    pub env: String,
    pub workload: Option<String>,
    pub approve: bool,
}

impl DecommissionOptions {
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            ..Self::default()
        }
    }

    pub fn with_workload(mut self, workload: Option<String>) -> Self {
        self.workload = workload;
        self
    }

    pub fn approved(mut self) -> Self {
        self.approve = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecommissionResult {
    pub env: String,
    pub record_path: PathBuf,
    /// `false` when there was nothing to delete
    pub deleted: bool,
}

pub struct DecommissionUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> DecommissionUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &DecommissionOptions) -> EnvgateResult<DecommissionResult> {
        if !options.approve {
            return Err(EnvgateError::Approval {
                flag: "--approve".to_string(),
            });
        }
        validate_env_name(&options.env)?;

        // Only the target is needed; the contract may already be gone.
        let policy = self.workspace.load_policy()?;
        let (target, _) = policy.select_target(&options.env, options.workload.as_deref())?;
        if target.provider != Provider::MockCloud {
            return Err(EnvgateError::Unsupported {
                operation: "decommission".to_string(),
                provider: target.provider.to_string(),
            });
        }

        let states = self.workspace.states();
        let _lock = states.lock(target.provider, &options.env)?;
        let deleted = states.delete(target.provider, &options.env)?;
        tracing::info!(env = %options.env, deleted, "decommissioned");

        Ok(DecommissionResult {
            env: options.env.clone(),
            record_path: states.record_path(target.provider, &options.env),
            deleted,
        })
    }
}
