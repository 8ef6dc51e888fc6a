//! Apply Result

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::entities::EnvFileRecord;
use crate::domain::services::StateDiff;

/// Result of an apply
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    /// Difference that was applied
    #[serde(flatten)]
    pub diff: StateDiff,
    /// Where the deployed record was written
    pub record_path: PathBuf,
    /// Redacted effective context written after the record
    pub context: PathBuf,
    /// Env-file delivery facts (envfile provider only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<EnvFileRecord>,
    /// Final HTTP status of the health check, if one ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck_status: Option<u16>,
    /// Fallback evidence file, if one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl ApplyResult {
    pub fn has_changes(&self) -> bool {
        !self.diff.is_noop()
    }
}
