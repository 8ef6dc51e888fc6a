//! Rotate Use Case
//!
//! Mockcloud only. Replaces the mock backing value of one secret with a fresh
//! random value and bumps its version and rotation time in the deployed
//! record. The bumped record is saved before the value is replaced, so the
//! record never lags a rotated value. The new value is never returned or
//! logged.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::BackendKind;
use crate::domain::ports::StateRepository;
use crate::domain::value_objects::Provider;
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::transport::rotate_mock_secret;

use super::workspace::Workspace;

#[derive(Debug, Clone, Default)]
pub struct RotateOptions {
    pub env: String,
    pub workload: Option<String>,
    pub secret: String,
    pub approve: bool,
}

impl RotateOptions {
    pub fn new(env: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            secret: secret.into(),
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
pub struct RotateResult {
    pub env: String,
    pub secret: String,
    pub version: u32,
    pub rotated_at: DateTime<Utc>,
}

pub struct RotateUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> RotateUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &RotateOptions) -> EnvgateResult<RotateResult> {
        if !options.approve {
            return Err(EnvgateError::Approval {
                flag: "--approve".to_string(),
            });
        }

        let ctx = self
            .workspace
            .load_env(&options.env, options.workload.as_deref())?;
        let desired = ctx.desired;
        let name = options.secret.as_str();

        if desired.provider != Provider::MockCloud {
            return Err(EnvgateError::Unsupported {
                operation: "rotate".to_string(),
                provider: desired.provider.to_string(),
            });
        }
        let backend = desired.secrets.get(name).map(|s| s.backend).ok_or_else(|| {
            EnvgateError::secret(
                name,
                format!("not referenced by the contract for env '{}'", desired.env),
            )
        })?;
        if backend != BackendKind::Mock {
            return Err(EnvgateError::secret(
                name,
                format!("rotation needs the mock backend (configured: {})", backend),
            ));
        }

        let _lock = self.workspace.lock(&desired)?;
        let states = self.workspace.states();
        let mut record = states.load(desired.provider, &desired.env)?.ok_or_else(|| {
            EnvgateError::secret(name, format!("env '{}' has no deployed state; apply first", desired.env))
        })?;
        if !record.secrets.contains_key(name) {
            return Err(EnvgateError::secret(
                name,
                "not present in the deployed state; apply first",
            ));
        }

        // Record the bump first; a failed rotation restores the previous record
        let previous = record.clone();
        let now = Utc::now();
        let version = record.bump_secret(name, now)?;
        states.save(&record)?;

        if let Err(err) = rotate_mock_secret(self.workspace.state_dir(), &desired.env, name) {
            tracing::warn!(secret = name, env = %desired.env, "rotation failed; restoring deployed record");
            return Err(match states.save(&previous) {
                Ok(()) => err,
                Err(restore) => EnvgateError::CorruptedState {
                    path: states.record_path(desired.provider, &desired.env),
                    message: format!(
                        "records version {} of '{}' but the mock secret was not rotated ({}); \
                         restoring the previous record failed: {}",
                        version, name, err, restore
                    ),
                },
            });
        }

        Ok(RotateResult {
            env: desired.env,
            secret: name.to_string(),
            version,
            rotated_at: now,
        })
    }
}
