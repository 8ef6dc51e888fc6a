//! Desired state entity
//!
//! The computed, secret-value-free configuration for one environment.
//! Secrets appear only as `{backend, stable_ref}` pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::secret_config::{BackendKind, SecretBackendConfig};
use super::target::CloudTarget;
use crate::domain::policies::{PolicyDecision, SignalSummary};
use crate::domain::value_objects::{Provider, SecretValue};

/// Value-free pointer at a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    pub backend: BackendKind,
    pub stable_ref: String,
}

/// Desired state of an environment
#[derive(Debug, Clone, Serialize)]
pub struct DesiredState {
    pub env: String,
    pub provider: Provider,
    pub runtime: String,
    pub config: BTreeMap<String, Value>,
    /// Secret name -> reference
    pub secrets: BTreeMap<String, SecretRef>,
    /// Variable name -> secret name
    pub secret_vars: BTreeMap<String, String>,
    pub warnings: Vec<String>,
    pub decision: PolicyDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preflight: Option<SignalSummary>,
    /// Apply should persist fallback evidence
    #[serde(skip)]
    pub record_evidence: bool,
    /// Injection plan: where and how this state is delivered
    #[serde(skip)]
    pub target: CloudTarget,
    /// Backend configuration of every referenced secret
    #[serde(skip)]
    pub secret_backends: BTreeMap<String, SecretBackendConfig>,
}

impl DesiredState {
    /// Config map with every secret variable replaced by `marker`
    pub fn redacted_view(&self, marker: &str) -> BTreeMap<String, Value> {
        let mut view = self.config.clone();
        for var in self.secret_vars.keys() {
            view.insert(var.clone(), Value::String(marker.to_string()));
        }
        view
    }

    /// Non-secret config plus every secret variable mapped to its value.
    ///
    /// Only used to render delivered content.
    pub fn materialize(&self, values: &BTreeMap<String, SecretValue>) -> BTreeMap<String, Value> {
        let mut out = self.config.clone();
        for (var, secret) in &self.secret_vars {
            if let Some(value) = values.get(secret) {
                out.insert(var.clone(), Value::String(value.expose().to_string()));
            }
        }
        out
    }
}
