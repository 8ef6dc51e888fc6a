//! Plan Use Case
//!
//! Builds the desired state, checks that every secret reference resolves
//! (without fetching values) and diffs against the deployed record. Never
//! mutates anything; `drift` is the same operation.

use serde::Serialize;

use crate::domain::policies::PolicyDecision;
use crate::domain::ports::StateRepository;
use crate::domain::services::{diff_state, StateDiff};
use crate::error::EnvgateResult;

use super::workspace::Workspace;

/// Options for plan and drift
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub env: String,
    pub workload: Option<String>,
}

impl PlanOptions {
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            workload: None,
        }
    }

    pub fn with_workload(mut self, workload: Option<String>) -> Self {
        self.workload = workload;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    #[serde(flatten)]
    pub diff: StateDiff,
    pub runtime: String,
    pub target_rule: Option<String>,
    pub decision: PolicyDecision,
    pub warnings: Vec<String>,
}

impl PlanResult {
    pub fn is_noop(&self) -> bool {
        self.diff.is_noop()
    }
}

pub struct PlanUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> PlanUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &PlanOptions) -> EnvgateResult<PlanResult> {
        let ctx = self
            .workspace
            .load_env(&options.env, options.workload.as_deref())?;
        let desired = ctx.desired;

        self.workspace.resolver(&ctx.policy).check_all(&desired)?;

        let deployed = self
            .workspace
            .states()
            .load(desired.provider, &desired.env)?;
        let diff = diff_state(&desired, deployed.as_ref());
        tracing::debug!(env = %desired.env, status = %diff.status, "planned");

        Ok(PlanResult {
            diff,
            runtime: desired.runtime,
            target_rule: desired.target_rule,
            decision: desired.decision,
            warnings: desired.warnings,
        })
    }
}
