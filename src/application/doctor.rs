//! Doctor Use Case
//!
//! Advisory: checks every secret reference of an environment for
//! resolvability and reports each problem instead of stopping at the first.
//! No value is fetched.

use serde::Serialize;

use crate::domain::value_objects::Provider;
use crate::error::EnvgateResult;
use crate::infrastructure::SecretStatus;

use super::workspace::Workspace;

#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    pub env: String,
    pub workload: Option<String>,
}

impl DoctorOptions {
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
pub struct DoctorResult {
    pub env: String,
    pub provider: Provider,
    pub runtime: String,
    pub secrets: Vec<SecretStatus>,
    pub warnings: Vec<String>,
}

impl DoctorResult {
    pub fn problems(&self) -> usize {
        self.secrets.iter().filter(|p| p.problem.is_some()).count()
    }

    pub fn is_healthy(&self) -> bool {
        self.problems() == 0
    }
}

pub struct DoctorUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> DoctorUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &DoctorOptions) -> EnvgateResult<DoctorResult> {
        let ctx = self
            .workspace
            .load_env(&options.env, options.workload.as_deref())?;
        let desired = ctx.desired;
        let secrets = self.workspace.resolver(&ctx.policy).report_all(&desired);

        Ok(DoctorResult {
            env: desired.env,
            provider: desired.provider,
            runtime: desired.runtime,
            secrets,
            warnings: desired.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::Project;

    #[test]
    fn reports_every_unresolvable_secret() {
        let project = Project::new();
        project.write(
            "contract.yaml",
            &format!(
                "{}  API_TOKEN:\n    type: string\n    secret: true\n    secret_ref: api_token\n",
                crate::application::fixtures::CONTRACT
            ),
        );
        project.write(
            "secrets/dev.yaml",
            "db_password: { backend: mock }\napi_token: { backend: env, env_var: API_TOKEN }\n",
        );
        let ws = project.workspace();

        let result = DoctorUseCase::new(&ws).execute(&DoctorOptions::new("dev")).unwrap();

        assert_eq!(result.secrets.len(), 2);
        assert_eq!(result.problems(), 2);
        let api = result.secrets.iter().find(|p| p.secret == "api_token").unwrap();
        assert_eq!(api.stable_ref, "env:API_TOKEN");
        assert!(api.problem.as_deref().unwrap().contains("API_TOKEN"));
    }

    #[test]
    fn resolvable_secrets_are_healthy() {
        let project = Project::new();
        project.mock_secret("dev", "db_password", "pw");
        let ws = project.workspace();

        let result = DoctorUseCase::new(&ws).execute(&DoctorOptions::new("dev")).unwrap();

        assert!(result.is_healthy());
        assert!(!serde_json::to_string(&result).unwrap().contains("\"pw\""));
    }
}
