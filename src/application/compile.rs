//! Compile Use Case
//!
//! Local development counterpart of apply: resolves every secret, writes the
//! env file to the project root with mode `0600` and the masked local
//! context. No deployed record is read or written.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::error::EnvgateResult;
use crate::infrastructure::fs::{resolve_against, LocalFs};
use crate::infrastructure::transport::{render_env_file, EnvFilePayload};

use super::context::write_local_context;
use super::workspace::Workspace;

/// Permission mode of compiled env files
pub const COMPILED_FILE_MODE: u32 = 0o600;

/// `.env.local` for dev, `.env.<env>.local` otherwise
pub fn local_env_file_name(env: &str) -> String {
    if env == "dev" {
        ".env.local".to_string()
    } else {
        format!(".env.{}.local", env)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub env: String,
    pub workload: Option<String>,
    /// Custom env-file path (absolute or relative to the root)
    pub env_file: Option<String>,
    pub write_env_file: bool,
    pub write_context: bool,
}

impl CompileOptions {
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            workload: None,
            env_file: None,
            write_env_file: true,
            write_context: true,
        }
    }

    pub fn with_workload(mut self, workload: Option<String>) -> Self {
        self.workload = workload;
        self
    }

    pub fn with_env_file(mut self, path: Option<String>) -> Self {
        self.env_file = path;
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.write_env_file = false;
        self
    }

    pub fn without_context(mut self) -> Self {
        self.write_context = false;
        self
    }
}

/// One compiled key; secret keys are named, never valued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledKey {
    pub name: String,
    pub secret: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    pub env: String,
    pub runtime: String,
    pub keys: Vec<CompiledKey>,
    /// Env file written, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
    /// Masked context written, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    pub warnings: Vec<String>,
}

pub struct CompileUseCase<'w> {
    workspace: &'w Workspace,
}

impl<'w> CompileUseCase<'w> {
    pub fn new(workspace: &'w Workspace) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, options: &CompileOptions) -> EnvgateResult<CompileResult> {
        let ctx = self
            .workspace
            .load_env(&options.env, options.workload.as_deref())?;
        let desired = ctx.desired;
        let root = self.workspace.root();

        let payload = {
            let mut resolver = self.workspace.resolver(&ctx.policy);
            let values = resolver.resolve_all(&desired)?;
            let materialized = desired.materialize(&values);
            EnvFilePayload::new(render_env_file(&desired.env, &desired.runtime, &materialized))
        };

        let env_file = if options.write_env_file {
            let path = match &options.env_file {
                Some(custom) => resolve_against(root, custom),
                None => root.join(local_env_file_name(&desired.env)),
            };
            LocalFs::new().write_atomic(&path, payload.content(), COMPILED_FILE_MODE)?;
            tracing::info!(path = %path.display(), bytes = payload.bytes, "compiled env file");
            Some(path)
        } else {
            None
        };

        let context = if options.write_context {
            Some(write_local_context(root, &desired, Utc::now())?)
        } else {
            None
        };

        let keys = desired
            .redacted_view("")
            .into_keys()
            .map(|name| CompiledKey {
                secret: desired.secret_vars.contains_key(&name),
                name,
            })
            .collect();

        Ok(CompileResult {
            env: desired.env,
            runtime: desired.runtime,
            keys,
            env_file,
            context,
            warnings: desired.warnings,
        })
    }
}
