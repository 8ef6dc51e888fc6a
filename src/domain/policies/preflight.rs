//! Preflight credential-chain scan
//!
//! Looks for credential shapes in the effective variable map that could let
//! a runtime fall back to long-lived access keys. Only variable names and
//! configured file paths are reported, never values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::policy::PolicyDecision;
use crate::domain::value_objects::{AuthMode, PreflightMode};
use crate::error::{EnvgateError, EnvgateResult};

/// Credential shapes of one cloud provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialChain {
    pub provider: String,
    #[serde(default)]
    pub access_key_vars: Vec<String>,
    #[serde(default)]
    pub secret_key_vars: Vec<String>,
    #[serde(default)]
    pub session_token_vars: Vec<String>,
    #[serde(default)]
    pub presence_vars: Vec<String>,
    #[serde(default)]
    pub credential_files: Vec<String>,
}

impl CredentialChain {
    /// Chains used when the policy does not configure any
    pub fn builtin() -> Vec<Self> {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        vec![
            CredentialChain {
                provider: "aws".to_string(),
                access_key_vars: names(&["AWS_ACCESS_KEY_ID"]),
                secret_key_vars: names(&["AWS_SECRET_ACCESS_KEY"]),
                session_token_vars: names(&["AWS_SESSION_TOKEN"]),
                ..Default::default()
            },
            CredentialChain {
                provider: "alibaba".to_string(),
                access_key_vars: names(&["ALIBABA_CLOUD_ACCESS_KEY_ID", "ALICLOUD_ACCESS_KEY"]),
                secret_key_vars: names(&[
                    "ALIBABA_CLOUD_ACCESS_KEY_SECRET",
                    "ALICLOUD_SECRET_KEY",
                ]),
                session_token_vars: names(&[
                    "ALIBABA_CLOUD_SECURITY_TOKEN",
                    "ALICLOUD_SECURITY_TOKEN",
                ]),
                ..Default::default()
            },
        ]
    }

    pub(crate) fn validate(&self, at: &str) -> EnvgateResult<()> {
        if self.provider.trim().is_empty() {
            return Err(EnvgateError::schema(
                format!("{}.provider", at),
                "provider must not be empty",
            ));
        }
        if self.access_key_vars.is_empty() != self.secret_key_vars.is_empty() {
            return Err(EnvgateError::schema(
                at,
                "access_key_vars and secret_key_vars must be declared together",
            ));
        }
        Ok(())
    }
}

/// Redaction-safe summary of detected signals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub has_ak: bool,
    pub has_sts: bool,
    pub ak_vars: Vec<String>,
    pub sts_vars: Vec<String>,
    pub presence_vars: Vec<String>,
    pub credential_files: Vec<String>,
}

fn is_set(env_map: &BTreeMap<String, Value>, var: &str) -> bool {
    match env_map.get(var) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Scan `env_map` for credential signals.
///
/// `file_exists` decides whether a configured credential file is present.
pub fn detect_signals(
    chains: &[CredentialChain],
    env_map: &BTreeMap<String, Value>,
    file_exists: &dyn Fn(&str) -> bool,
) -> SignalSummary {
    let mut ak = BTreeSet::new();
    let mut sts = BTreeSet::new();
    let mut presence = BTreeSet::new();
    let mut files = BTreeSet::new();

    for chain in chains {
        let first_set = |vars: &[String]| vars.iter().find(|v| is_set(env_map, v)).cloned();

        if let (Some(id), Some(secret)) = (
            first_set(&chain.access_key_vars),
            first_set(&chain.secret_key_vars),
        ) {
            match first_set(&chain.session_token_vars) {
                Some(token) => {
                    sts.extend([id, secret, token]);
                }
                None => {
                    ak.extend([id, secret]);
                }
            }
        }

        presence.extend(
            chain
                .presence_vars
                .iter()
                .filter(|v| is_set(env_map, v))
                .cloned(),
        );
        files.extend(
            chain
                .credential_files
                .iter()
                .filter(|f| file_exists(f.as_str()))
                .cloned(),
        );
    }

    SignalSummary {
        has_ak: !ak.is_empty() || !presence.is_empty() || !files.is_empty(),
        has_sts: !sts.is_empty(),
        ak_vars: ak.into_iter().collect(),
        sts_vars: sts.into_iter().collect(),
        presence_vars: presence.into_iter().collect(),
        credential_files: files.into_iter().collect(),
    }
}

/// Result of a non-fatal preflight run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightOutcome {
    pub summary: Option<SignalSummary>,
    pub warnings: Vec<String>,
    /// Whether apply should persist fallback evidence
    pub record_evidence: bool,
}

/// Evaluate the signals against the decided posture.
///
/// `fail`-mode violations are returned as [`EnvgateError::Preflight`].
pub fn run_preflight(
    decision: &PolicyDecision,
    chains: &[CredentialChain],
    env_map: &BTreeMap<String, Value>,
    file_exists: &dyn Fn(&str) -> bool,
) -> EnvgateResult<PreflightOutcome> {
    if decision.preflight_mode == PreflightMode::Off {
        return Ok(PreflightOutcome::default());
    }

    let summary = detect_signals(chains, env_map, file_exists);
    let mut outcome = PreflightOutcome::default();

    if summary.has_ak {
        match decision.auth_mode {
            AuthMode::RoleOnly => {
                let message = format!(
                    "auth_mode=role-only but credential-chain signals may enable access-key fallback ({})",
                    describe(&summary)
                );
                if decision.preflight_mode == PreflightMode::Fail {
                    return Err(EnvgateError::Preflight { message });
                }
                outcome.warnings.push(format!("preflight: {}", message));
            }
            AuthMode::Auto => {
                outcome.warnings.push(format!(
                    "preflight: credential-chain signals detected under auth_mode=auto ({}); make sure access-key fallback is intended",
                    describe(&summary)
                ));
                outcome.record_evidence = decision.record_fallback_evidence && !summary.has_sts;
            }
            AuthMode::AkOnly => {}
        }
    }

    outcome.summary = Some(summary);
    Ok(outcome)
}

fn describe(summary: &SignalSummary) -> String {
    let mut parts = Vec::new();
    if !summary.ak_vars.is_empty() {
        parts.push(format!("ak_vars={}", summary.ak_vars.join(",")));
    }
    if !summary.presence_vars.is_empty() {
        parts.push(format!("presence_vars={}", summary.presence_vars.join(",")));
    }
    if !summary.credential_files.is_empty() {
        parts.push(format!(
            "credential_files={}",
            summary.credential_files.join(",")
        ));
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    fn no_files(_: &str) -> bool {
        false
    }

    fn decision(auth_mode: AuthMode, preflight_mode: PreflightMode) -> PolicyDecision {
        PolicyDecision {
            auth_mode,
            preflight_mode,
            record_fallback_evidence: true,
            ..Default::default()
        }
    }

    #[test]
    fn access_key_pair_is_an_ak_signal() {
        let env = map(&[
            ("AWS_ACCESS_KEY_ID", "<redacted>"),
            ("AWS_SECRET_ACCESS_KEY", "<redacted>"),
        ]);
        let s = detect_signals(&CredentialChain::builtin(), &env, &no_files);
        assert!(s.has_ak);
        assert!(!s.has_sts);
        assert_eq!(s.ak_vars, vec!["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]);
    }

    #[test]
    fn session_token_triple_is_sts() {
        let env = map(&[
            ("AWS_ACCESS_KEY_ID", "x"),
            ("AWS_SECRET_ACCESS_KEY", "y"),
            ("AWS_SESSION_TOKEN", "z"),
        ]);
        let s = detect_signals(&CredentialChain::builtin(), &env, &no_files);
        assert!(!s.has_ak);
        assert!(s.has_sts);
        assert_eq!(s.sts_vars.len(), 3);
    }

    #[test]
    fn empty_values_are_not_signals() {
        let env = map(&[("AWS_ACCESS_KEY_ID", " "), ("AWS_SECRET_ACCESS_KEY", "y")]);
        let s = detect_signals(&CredentialChain::builtin(), &env, &no_files);
        assert_eq!(s, SignalSummary::default());
    }

    #[test]
    fn presence_vars_and_files_count_as_ak() {
        let chains = vec![CredentialChain {
            provider: "gcp".to_string(),
            presence_vars: vec!["GOOGLE_APPLICATION_CREDENTIALS".to_string()],
            credential_files: vec!["~/.config/gcloud/creds.json".to_string()],
            ..Default::default()
        }];
        let s = detect_signals(&chains, &BTreeMap::new(), &|_| true);
        assert!(s.has_ak);
        assert_eq!(s.credential_files, vec!["~/.config/gcloud/creds.json"]);
        assert!(s.presence_vars.is_empty());
    }

    #[test]
    fn role_only_fails_in_fail_mode_and_warns_otherwise() {
        let env = map(&[("AWS_ACCESS_KEY_ID", "a"), ("AWS_SECRET_ACCESS_KEY", "b")]);
        let chains = CredentialChain::builtin();

        let err = run_preflight(
            &decision(AuthMode::RoleOnly, PreflightMode::Fail),
            &chains,
            &env,
            &no_files,
        )
        .unwrap_err();
        assert!(matches!(err, EnvgateError::Preflight { .. }));

        let outcome = run_preflight(
            &decision(AuthMode::RoleOnly, PreflightMode::Warn),
            &chains,
            &env,
            &no_files,
        )
        .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(!outcome.record_evidence);
    }

    #[test]
    fn auto_warns_and_requests_evidence() {
        let env = map(&[("AWS_ACCESS_KEY_ID", "a"), ("AWS_SECRET_ACCESS_KEY", "b")]);
        let outcome = run_preflight(
            &decision(AuthMode::Auto, PreflightMode::Fail),
            &CredentialChain::builtin(),
            &env,
            &no_files,
        )
        .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.record_evidence);
    }

    #[test]
    fn off_skips_detection() {
        let env = map(&[("AWS_ACCESS_KEY_ID", "a"), ("AWS_SECRET_ACCESS_KEY", "b")]);
        let outcome = run_preflight(
            &decision(AuthMode::RoleOnly, PreflightMode::Off),
            &CredentialChain::builtin(),
            &env,
            &no_files,
        )
        .unwrap();
        assert_eq!(outcome, PreflightOutcome::default());
    }
}
