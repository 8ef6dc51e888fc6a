//! Local env-file delivery
//!
//! Pre-commands, atomic write with the configured mode, post-commands.
//! Hooks run through `sh -c` from the project root.

use std::path::{Path, PathBuf};

use super::envfile::EnvFilePayload;
use crate::domain::entities::LocalTransport;
use crate::domain::ports::CommandRunner;
use crate::domain::value_objects::ContentHash;
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::fs::{quote, resolve_against, LocalFs};

const HOST: &str = "local";

/// Destination of the env file
pub fn local_path(root: &Path, local: &LocalTransport, file_name: &str) -> PathBuf {
    resolve_against(root, &local.dir.to_string_lossy()).join(file_name)
}

fn run_hook(root: &Path, runner: &dyn CommandRunner, stage: &str, command: &str) -> EnvgateResult<()> {
    let script = format!("cd {} && {}", quote(&root.to_string_lossy()), command);
    let operation = format!("{} '{}'", stage, command);
    let output = runner
        .run("sh", &["-c".to_string(), script], None)
        .map_err(|e| EnvgateError::Transport {
            operation: operation.clone(),
            host: HOST.to_string(),
            message: e.to_string(),
        })?;
    if !output.success() {
        return Err(EnvgateError::Transport {
            operation,
            host: HOST.to_string(),
            message: output.exit_label(),
        });
    }
    Ok(())
}

/// Deliver `payload` and return the written path
pub fn deliver_local(
    root: &Path,
    runner: &dyn CommandRunner,
    local: &LocalTransport,
    file_name: &str,
    payload: &EnvFilePayload,
) -> EnvgateResult<PathBuf> {
    for command in &local.hooks.pre {
        run_hook(root, runner, "pre-command", command)?;
    }

    let path = local_path(root, local, file_name);
    LocalFs::new()
        .write_atomic(&path, payload.content(), local.mode)
        .map_err(|e| EnvgateError::Transport {
            operation: format!("write {}", path.display()),
            host: HOST.to_string(),
            message: e.to_string(),
        })?;
    tracing::info!(path = %path.display(), bytes = payload.bytes, "delivered env file");

    for command in &local.hooks.post {
        run_hook(root, runner, "post-command", command)?;
    }
    Ok(path)
}

/// Re-hash a delivered file. `None` if it no longer exists.
pub fn local_hash(path: &Path) -> EnvgateResult<Option<ContentHash>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(LocalFs::new().hash(path)?))
}
