//! Deployed state entity - the last-recorded record of an apply
//!
//! This is the only persisted entity. It carries secret *metadata* (backend,
//! stable reference, version, rotation time) but never a secret value.
//! I/O is handled by the deployed-state repository.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::desired_state::{DesiredState, SecretRef};
use super::secret_config::BackendKind;
use super::target::ComposeMetadata;
use crate::domain::value_objects::{ContentHash, Provider};
use crate::error::{EnvgateError, EnvgateResult};

/// Current record format
pub const RECORD_VERSION: u32 = 1;

/// Persisted metadata of one secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub backend: BackendKind,
    pub stable_ref: String,
    pub version: u32,
    pub rotated_at: DateTime<Utc>,
}

impl SecretMetadata {
    /// Drop volatile fields, keeping what identifies the secret
    pub fn stable(&self) -> SecretRef {
        SecretRef {
            backend: self.backend,
            stable_ref: self.stable_ref.clone(),
        }
    }
}

/// Delivery facts of an env file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvFileRecord {
    pub path: String,
    pub sha256: ContentHash,
    pub bytes: u64,
    pub transport: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
}

/// Persisted record of what was applied to an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedState {
    pub record_version: u32,
    pub env: String,
    pub provider: Provider,
    pub runtime: String,
    pub updated_at: DateTime<Utc>,
    pub config: BTreeMap<String, Value>,
    pub secrets: BTreeMap<String, SecretMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envfile: Option<EnvFileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose: Option<ComposeMetadata>,
}

impl DeployedState {
    /// Build the record for an apply of `desired`.
    ///
    /// Secrets already present in `previous` under the same name keep their
    /// version and rotation time; new secrets start at version 1.
    pub fn from_desired(
        desired: &DesiredState,
        previous: Option<&DeployedState>,
        now: DateTime<Utc>,
    ) -> Self {
        let secrets = desired
            .secrets
            .iter()
            .map(|(name, secret)| {
                let carried = previous.and_then(|p| p.secrets.get(name));
                let metadata = SecretMetadata {
                    backend: secret.backend,
                    stable_ref: secret.stable_ref.clone(),
                    version: carried.map_or(1, |m| m.version),
                    rotated_at: carried.map_or(now, |m| m.rotated_at),
                };
                (name.clone(), metadata)
            })
            .collect();

        Self {
            record_version: RECORD_VERSION,
            env: desired.env.clone(),
            provider: desired.provider,
            runtime: desired.runtime.clone(),
            updated_at: now,
            config: desired.config.clone(),
            secrets,
            envfile: None,
            compose: desired.target.compose.clone(),
        }
    }

    /// Record a rotation: bump the version and stamp the rotation time
    pub fn bump_secret(&mut self, name: &str, now: DateTime<Utc>) -> EnvgateResult<u32> {
        let metadata = self.secrets.get_mut(name).ok_or_else(|| {
            EnvgateError::secret(name, "not present in the deployed state; apply first")
        })?;
        metadata.version += 1;
        metadata.rotated_at = now;
        self.updated_at = now;
        Ok(metadata.version)
    }
}
