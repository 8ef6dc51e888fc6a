//! Fallback evidence
//!
//! When `auth_mode=auto` sees access-key signals without a session token and
//! the policy asks for it, apply leaves a timestamped record of the posture
//! and the signal *names* under the evidence directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::DesiredState;
use crate::domain::policies::SignalSummary;
use crate::domain::value_objects::{AuthMode, PreflightMode};
use crate::error::EnvgateResult;
use crate::infrastructure::fs::{resolve_against, LocalFs};

#[derive(Debug, Serialize)]
struct Evidence<'a> {
    kind: &'static str,
    env: &'a str,
    runtime_target: &'a str,
    workload: Option<&'a str>,
    auth_mode: AuthMode,
    preflight_mode: PreflightMode,
    rule_id: Option<&'a str>,
    signals: Option<&'a SignalSummary>,
    recorded_at: DateTime<Utc>,
}

/// Write `<evidence_dir>/<env>-<timestamp>.json` and return its path
pub fn write_evidence(
    root: &Path,
    desired: &DesiredState,
    now: DateTime<Utc>,
) -> EnvgateResult<PathBuf> {
    let decision = &desired.decision;
    let evidence = Evidence {
        kind: "auth-fallback",
        env: &desired.env,
        runtime_target: &decision.runtime_target,
        workload: decision.workload.as_deref(),
        auth_mode: decision.auth_mode,
        preflight_mode: decision.preflight_mode,
        rule_id: decision.rule_id.as_deref(),
        signals: desired.preflight.as_ref(),
        recorded_at: now,
    };

    let dir = resolve_against(root, &decision.evidence_dir.to_string_lossy());
    let path = dir.join(format!(
        "{}-{}.json",
        desired.env,
        now.format("%Y%m%dT%H%M%S%.3fZ")
    ));
    let mut body = serde_json::to_vec_pretty(&evidence)?;
    body.push(b'\n');
    LocalFs::new().write_atomic(&path, &body, 0o600)?;

    tracing::info!(path = %path.display(), "recorded fallback evidence");
    Ok(path)
}
