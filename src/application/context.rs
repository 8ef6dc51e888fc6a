//! Effective context
//!
//! After a successful apply the effective configuration of the environment is
//! written to `docs/context/env/effective-cloud-<env>.json` for humans and
//! tooling to read. It holds non-secret config and secret references only.
//! `compile` writes the local counterpart, `effective-<env>.json`, with every
//! secret variable masked.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::entities::{DesiredState, SecretRef};
use crate::domain::value_objects::{Provider, REDACTED};
use crate::error::EnvgateResult;
use crate::infrastructure::fs::LocalFs;

/// Directory under the project root holding context artifacts
pub const CONTEXT_DIR: &str = "docs/context/env";

#[derive(Debug, Serialize)]
struct Redaction {
    secrets: &'static str,
}

#[derive(Debug, Serialize)]
struct EffectiveContext<'a> {
    generated_at: DateTime<Utc>,
    env: &'a str,
    provider: Provider,
    runtime: &'a str,
    config: &'a BTreeMap<String, Value>,
    secrets: &'a BTreeMap<String, SecretRef>,
    var_to_secret_ref: &'a BTreeMap<String, String>,
    redaction: Redaction,
}

#[derive(Debug, Serialize)]
struct LocalContext<'a> {
    generated_at: DateTime<Utc>,
    env: &'a str,
    runtime: &'a str,
    values: BTreeMap<String, Value>,
}

pub fn context_path(root: &Path, env: &str) -> PathBuf {
    root.join(CONTEXT_DIR).join(format!("effective-cloud-{}.json", env))
}

pub fn local_context_path(root: &Path, env: &str) -> PathBuf {
    root.join(CONTEXT_DIR).join(format!("effective-{}.json", env))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> EnvgateResult<()> {
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');
    LocalFs::new().write_atomic(path, &body, 0o644)?;
    tracing::debug!(path = %path.display(), "wrote effective context");
    Ok(())
}

/// Write the redacted effective context and return its path
pub fn write_effective_context(
    root: &Path,
    desired: &DesiredState,
    now: DateTime<Utc>,
) -> EnvgateResult<PathBuf> {
    let context = EffectiveContext {
        generated_at: now,
        env: &desired.env,
        provider: desired.provider,
        runtime: &desired.runtime,
        config: &desired.config,
        secrets: &desired.secrets,
        var_to_secret_ref: &desired.secret_vars,
        redaction: Redaction {
            secrets: "values omitted",
        },
    };

    let path = context_path(root, &desired.env);
    write_json(&path, &context)?;
    Ok(path)
}

/// Write the locally compiled values with secrets masked and return the path
pub fn write_local_context(
    root: &Path,
    desired: &DesiredState,
    now: DateTime<Utc>,
) -> EnvgateResult<PathBuf> {
    let context = LocalContext {
        generated_at: now,
        env: &desired.env,
        runtime: &desired.runtime,
        values: desired.redacted_view(REDACTED),
    };
    let path = local_context_path(root, &desired.env);
    write_json(&path, &context)?;
    Ok(path)
}
