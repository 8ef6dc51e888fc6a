//! Verify Use Case
//!
//! Diffs desired against deployed like `plan`, then re-hashes delivered env
//! files: local files always, ssh files only with `--check-remote` (which
//! also needs `--approve-remote`). Verification is clean when the diff is
//! NOOP and every hash matches the record.

use std::path::Path;

use serde::Serialize;

use crate::domain::entities::{DesiredState, EnvFileRecord, SshHost, Transport};
use crate::domain::ports::StateRepository;
use crate::domain::services::{diff_state, StateDiff};
use crate::domain::value_objects::ContentHash;
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::transport::{local_hash, remote_hashes, resolve_targets};

use super::workspace::Workspace;

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub env: String,
    pub workload: Option<String>,
    pub check_remote: bool,
    pub approve_remote: bool,
}

impl VerifyOptions {
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

    /// `--check-remote --approve-remote`
    pub fn with_remote_check(mut self, check: bool, approve: bool) -> Self {
        self.check_remote = check;
        self.approve_remote = approve;
        self
    }
}

/// Re-hash of one delivered copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashCheck {
    pub host: String,
    pub path: String,
    pub expected: ContentHash,
    /// `None` when the file is gone
    pub actual: Option<ContentHash>,
}

impl HashCheck {
    pub fn matches(&self) -> bool {
        self.actual.as_ref() == Some(&self.expected)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    #[serde(flatten)]
    pub diff: StateDiff,
    pub hashes: Vec<HashCheck>,
    /// ssh copies exist but were not re-hashed
    pub remote_skipped: bool,
    /// Recorded hosts that are no longer configured and could not be checked
    pub unverified: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerifyResult {
    pub fn is_clean(&self) -> bool {
        self.diff.is_noop() && self.unverified.is_empty() && self.hashes.iter().all(HashCheck::matches)
    }

    /// Error describing why verification is not clean, if it is not
    pub fn failure(&self) -> Option<EnvgateError> {
        let mut problems = Vec::new();
        if !self.diff.is_noop() {
            problems.push(format!("state is {}", self.diff.summary()));
        }
        for check in self.hashes.iter().filter(|c| !c.matches()) {
            problems.push(match &check.actual {
                Some(_) => format!("hash mismatch for {} on {}", check.path, check.host),
                None => format!("{} missing on {}", check.path, check.host),
            });
        }
        for host in &self.unverified {
            problems.push(format!("{} is recorded but no longer configured; not verified", host));
        }
        (!problems.is_empty()).then(|| EnvgateError::Verification {
            message: problems.join("; "),
        })
    }
}

pub struct VerifyUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> VerifyUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &VerifyOptions) -> EnvgateResult<VerifyResult> {
        if options.check_remote && !options.approve_remote {
            return Err(EnvgateError::Approval {
                flag: "--approve-remote".to_string(),
            });
        }

        let ctx = self
            .workspace
            .load_env(&options.env, options.workload.as_deref())?;
        let desired = ctx.desired;
        let deployed = self
            .workspace
            .states()
            .load(desired.provider, &desired.env)?;
        let diff = diff_state(&desired, deployed.as_ref());

        let mut hashes = Vec::new();
        let mut unverified = Vec::new();
        let mut remote_skipped = false;
        if let Some(delivered) = deployed.as_ref().and_then(|d| d.envfile.as_ref()) {
            if delivered.transport == "ssh" && !options.check_remote {
                remote_skipped = true;
            } else {
                (hashes, unverified) = self.rehash(&desired, delivered)?;
            }
        }
        tracing::debug!(env = %desired.env, status = %diff.status, checked = hashes.len(), "verified");

        Ok(VerifyResult {
            diff,
            hashes,
            remote_skipped,
            unverified,
            warnings: desired.warnings,
        })
    }

    fn rehash(
        &self,
        desired: &DesiredState,
        delivered: &EnvFileRecord,
    ) -> EnvgateResult<(Vec<HashCheck>, Vec<String>)> {
        let check = |host: String, actual: Option<ContentHash>| HashCheck {
            host,
            path: delivered.path.clone(),
            expected: delivered.sha256.clone(),
            actual,
        };

        if delivered.transport != "ssh" {
            let actual = local_hash(Path::new(&delivered.path))?;
            return Ok((vec![check("local".to_string(), actual)], Vec::new()));
        }

        // Connection settings come from the current target. Every recorded
        // host is either re-hashed or reported as unverified.
        let Some(Transport::Ssh(ssh)) = &desired.target.transport else {
            return Err(EnvgateError::Unsupported {
                operation: "remote verification".to_string(),
                provider: format!("{} without an ssh transport", desired.provider),
            });
        };
        if delivered.hosts.is_empty() {
            return Err(EnvgateError::CorruptedState {
                path: self.workspace.states().record_path(desired.provider, &desired.env),
                message: "ssh delivery lists no hosts".to_string(),
            });
        }

        let configured = resolve_targets(self.workspace.root(), ssh)?;
        let (hosts, unverified) = partition_recorded(configured, &delivered.hosts);

        let checks = remote_hashes(self.workspace.runner(), ssh, &hosts, &delivered.path)?
            .into_iter()
            .map(|(host, actual)| check(host, actual))
            .collect();
        Ok((checks, unverified))
    }
}

/// Configured hosts that the record lists, and recorded hosts no longer configured
fn partition_recorded(configured: Vec<SshHost>, recorded: &[String]) -> (Vec<SshHost>, Vec<String>) {
    let hosts: Vec<SshHost> = configured
        .into_iter()
        .filter(|h| recorded.contains(&h.destination()))
        .collect();
    let missing = recorded
        .iter()
        .filter(|r| !hosts.iter().any(|h| &h.destination() == *r))
        .cloned()
        .collect();
    (hosts, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::apply::{ApplyOptions, ApplyUseCase};
    use crate::application::fixtures::{Project, ENVFILE_POLICY, SSH_POLICY};
    use crate::domain::services::PlanStatus;

    fn applied(policy: Option<&str>) -> Project {
        let project = Project::new();
        if let Some(policy) = policy {
            project.write("policy.yaml", policy);
        }
        project.mock_secret("dev", "db_password", "pw");
        let ws = project.workspace();
        ApplyUseCase::new(&ws)
            .execute(&ApplyOptions::new("dev").approved().remote_approved())
            .unwrap();
        project.runner.calls.borrow_mut().clear();
        project
    }

    #[test]
    fn never_applied_is_not_clean() {
        let project = Project::new();
        let ws = project.workspace();
        let result = VerifyUseCase::new(&ws).execute(&VerifyOptions::new("dev")).unwrap();
        assert_eq!(result.diff.status, PlanStatus::Create);
        assert!(!result.is_clean());
        assert!(result.failure().unwrap().to_string().contains("CREATE"));
    }

    #[test]
    fn applied_mockcloud_is_clean() {
        let project = applied(None);
        let ws = project.workspace();
        let result = VerifyUseCase::new(&ws).execute(&VerifyOptions::new("dev")).unwrap();
        assert!(result.is_clean());
        assert!(result.failure().is_none());
    }

    #[test]
    fn config_drift_is_reported() {
        let project = applied(None);
        project.write("values/dev.yaml", "LOG_LEVEL: debug\n");
        let ws = project.workspace();
        let result = VerifyUseCase::new(&ws).execute(&VerifyOptions::new("dev")).unwrap();
        assert_eq!(result.diff.status, PlanStatus::Update);
        assert!(result.diff.config.changed.contains_key("LOG_LEVEL"));
    }

    #[test]
    fn tampered_local_file_fails_hash_check() {
        let project = applied(Some(ENVFILE_POLICY));
        let ws = project.workspace();
        let clean = VerifyUseCase::new(&ws).execute(&VerifyOptions::new("dev")).unwrap();
        assert!(clean.is_clean());
        assert_eq!(clean.hashes.len(), 1);

        std::fs::write(project.root().join("deploy/dev.env"), "EDITED=1\n").unwrap();
        let result = VerifyUseCase::new(&ws).execute(&VerifyOptions::new("dev")).unwrap();
        assert!(result.diff.is_noop());
        assert!(!result.is_clean());
        assert!(result
            .failure()
            .unwrap()
            .to_string()
            .contains("hash mismatch"));
    }

    #[test]
    fn remote_copies_are_skipped_without_check_remote() {
        let project = applied(Some(SSH_POLICY));
        let ws = project.workspace();
        let result = VerifyUseCase::new(&ws).execute(&VerifyOptions::new("dev")).unwrap();
        assert!(result.remote_skipped);
        assert!(result.is_clean());
        assert!(project.runner.calls.borrow().is_empty());
    }

    #[test]
    fn check_remote_needs_approval() {
        let project = applied(Some(SSH_POLICY));
        let ws = project.workspace();
        let err = VerifyUseCase::new(&ws)
            .execute(&VerifyOptions::new("dev").with_remote_check(true, false))
            .unwrap_err();
        assert!(matches!(err, EnvgateError::Approval { .. }));
    }

    #[test]
    fn missing_remote_file_fails_verification() {
        let project = applied(Some(SSH_POLICY));
        project.runner.reply("ssh", 0, "missing\n");
        let ws = project.workspace();
        let result = VerifyUseCase::new(&ws)
            .execute(&VerifyOptions::new("dev").with_remote_check(true, true))
            .unwrap();
        assert_eq!(result.hashes.len(), 2);
        assert!(!result.is_clean());
        assert!(result
            .failure()
            .unwrap()
            .to_string()
            .contains("/etc/app/dev.env missing on deploy@web1"));
    }

    #[test]
    fn hosts_dropped_from_the_policy_fail_remote_check() {
        let project = applied(Some(SSH_POLICY));
        project.write(
            "policy.yaml",
            &SSH_POLICY.replace(r#"["deploy@web1", "deploy@web2:2222"]"#, r#"["deploy@web3"]"#),
        );
        let ws = project.workspace();

        let result = VerifyUseCase::new(&ws)
            .execute(&VerifyOptions::new("dev").with_remote_check(true, true))
            .unwrap();

        assert!(result.hashes.is_empty());
        assert_eq!(result.unverified, vec!["deploy@web1", "deploy@web2"]);
        assert!(!result.is_clean());
        let message = result.failure().unwrap().to_string();
        assert!(message.contains("deploy@web1 is recorded but no longer configured"));
        assert!(project.runner.calls.borrow().is_empty());
    }

    #[test]
    fn partially_reconfigured_hosts_check_the_rest() {
        let project = applied(Some(SSH_POLICY));
        project.write(
            "policy.yaml",
            &SSH_POLICY.replace(r#"["deploy@web1", "deploy@web2:2222"]"#, r#"["deploy@web2:2222"]"#),
        );
        project.runner.reply("ssh", 0, "missing\n");
        let ws = project.workspace();

        let result = VerifyUseCase::new(&ws)
            .execute(&VerifyOptions::new("dev").with_remote_check(true, true))
            .unwrap();

        assert_eq!(result.unverified, vec!["deploy@web1"]);
        assert_eq!(result.hashes.len(), 1);
        assert!(!result.is_clean());
    }
}
