//! Apply Use Case
//!
//! Orchestrates one apply:
//! 1. Check approvals (before any side effect)
//! 2. Build the desired state and take the environment lock
//! 3. Check every secret reference
//! 4. Deliver (envfile only): resolve values, render, write, health check
//! 5. Persist the deployed record and the redacted effective context, then
//!    fallback evidence if requested
//!
//! Delivery is not rolled back on failure; the record is only written once
//! delivery succeeded.

use chrono::Utc;

use crate::domain::entities::{DeployedState, DesiredState, EnvFileRecord, Transport};
use crate::domain::ports::StateRepository;
use crate::domain::services::diff_state;
use crate::domain::value_objects::Provider;
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::secrets::SecretResolver;
use crate::infrastructure::transport::{
    deliver_local, deliver_ssh, local_path, remote_path, render_env_file, resolve_targets,
    wait_healthy, EnvFilePayload,
};

use super::super::context::write_effective_context;
use super::super::evidence::write_evidence;
use super::super::workspace::Workspace;
use super::options::ApplyOptions;
use super::result::ApplyResult;

pub struct ApplyUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> ApplyUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &ApplyOptions) -> EnvgateResult<ApplyResult> {
        if !options.approve {
            return Err(EnvgateError::Approval {
                flag: "--approve".to_string(),
            });
        }

        let ctx = self
            .workspace
            .load_env(&options.env, options.workload.as_deref())?;
        let desired = ctx.desired;

        let remote = desired
            .target
            .transport
            .as_ref()
            .is_some_and(Transport::is_remote);
        if remote && !options.approve_remote {
            return Err(EnvgateError::Approval {
                flag: "--approve-remote".to_string(),
            });
        }

        let _lock = self.workspace.lock(&desired)?;
        let mut resolver = self.workspace.resolver(&ctx.policy);
        resolver.check_all(&desired)?;

        let states = self.workspace.states();
        let previous = states.load(desired.provider, &desired.env)?;
        let diff = diff_state(&desired, previous.as_ref());

        let now = Utc::now();
        let mut record = DeployedState::from_desired(&desired, previous.as_ref(), now);

        let mut healthcheck_status = None;
        if desired.provider == Provider::EnvFile {
            self.deliver_env_file(&desired, &mut resolver, &mut record)?;
            if let Some(check) = &desired.target.healthcheck {
                let timing = self.workspace.config().healthcheck.timing();
                healthcheck_status = Some(wait_healthy(self.workspace.runner(), check, timing)?);
            }
        }

        states.save(&record)?;
        tracing::info!(env = %desired.env, provider = %desired.provider, status = %diff.status, "applied");
        let context = write_effective_context(self.workspace.root(), &desired, now)?;

        let evidence = if desired.record_evidence {
            Some(write_evidence(self.workspace.root(), &desired, now)?)
        } else {
            None
        };

        Ok(ApplyResult {
            diff,
            record_path: states.record_path(desired.provider, &desired.env),
            context,
            delivered: record.envfile,
            healthcheck_status,
            evidence,
            warnings: desired.warnings,
        })
    }

    /// Render the env file and deliver it through the target's transport.
    ///
    /// Fills `record.envfile`; for ssh the full record is also delivered as
    /// the companion metadata file.
    fn deliver_env_file(
        &self,
        desired: &DesiredState,
        resolver: &mut SecretResolver<'_>,
        record: &mut DeployedState,
    ) -> EnvgateResult<()> {
        let transport = desired.target.transport.as_ref().ok_or_else(|| {
            EnvgateError::schema("targets.transport", "envfile targets require a transport")
        })?;

        let payload = {
            let values = resolver.resolve_all(desired)?;
            let materialized = desired.materialize(&values);
            EnvFilePayload::new(render_env_file(&desired.env, &desired.runtime, &materialized))
        };
        let file_name = desired.target.env_file_name(&desired.env);
        let root = self.workspace.root();
        let runner = self.workspace.runner();

        match transport {
            Transport::Local(local) => {
                let path = local_path(root, local, &file_name);
                record.envfile = Some(EnvFileRecord {
                    path: path.display().to_string(),
                    sha256: payload.sha256.clone(),
                    bytes: payload.bytes,
                    transport: transport.kind().to_string(),
                    hosts: Vec::new(),
                });
                deliver_local(root, runner, local, &file_name, &payload)?;
            }
            Transport::Ssh(ssh) => {
                let hosts = resolve_targets(root, ssh)?;
                record.envfile = Some(EnvFileRecord {
                    path: remote_path(ssh, &file_name),
                    sha256: payload.sha256.clone(),
                    bytes: payload.bytes,
                    transport: transport.kind().to_string(),
                    hosts: hosts.iter().map(|h| h.destination()).collect(),
                });
                let mut metadata = serde_json::to_vec_pretty(&*record)?;
                metadata.push(b'\n');
                deliver_ssh(runner, ssh, &hosts, &file_name, &payload, &metadata)?;
            }
        }
        Ok(())
    }
}
