//! Policy document and decision engine
//!
//! The policy carries two rule sets evaluated with [`select_rule`]:
//! `auth` derives the authentication/preflight posture, `targets` selects
//! where desired state is delivered. It also holds the preflight credential
//! chains and the bws backend settings.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::preflight::CredentialChain;
use super::rule_matcher::{select_rule, MatchInput, PolicyRule, Predicate, TargetPredicate};
use crate::domain::entities::{BwsScope, CloudTarget, TargetDocument};
use crate::domain::value_objects::{AuthMode, PreflightMode};
use crate::error::{EnvgateError, EnvgateResult};

/// The only supported policy document version
pub const POLICY_VERSION: u32 = 1;

/// Default directory for fallback evidence, relative to the project root
pub const DEFAULT_EVIDENCE_DIR: &str = ".envgate/evidence";

/// Default access-token variable gating the bws backend
pub const DEFAULT_BWS_TOKEN_ENV: &str = "BWS_ACCESS_TOKEN";

// === Documents ===

/// Policy as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub auth: AuthDocument,
    #[serde(default)]
    pub preflight: PreflightDocument,
    #[serde(default)]
    pub targets: TargetsDocument,
    #[serde(default)]
    pub bws: BwsDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthDocument {
    #[serde(default)]
    pub defaults: AuthSettingsDocument,
    #[serde(default)]
    pub evidence_dir: Option<String>,
    #[serde(default)]
    pub record_fallback_evidence: Option<bool>,
    #[serde(default)]
    pub rules: Vec<AuthRuleDocument>,
}

/// Fields an auth default or rule `set` block may override
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettingsDocument {
    #[serde(default)]
    pub auth_mode: Option<String>,
    #[serde(default)]
    pub preflight_mode: Option<String>,
    #[serde(default)]
    pub record_fallback_evidence: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthRuleDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "match", default)]
    pub predicate: Option<Predicate>,
    #[serde(default)]
    pub set: AuthSettingsDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreflightDocument {
    /// `None` selects the built-in chains; an empty list disables detection
    #[serde(default)]
    pub credential_chains: Option<Vec<CredentialChain>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsDocument {
    #[serde(default)]
    pub defaults: TargetDocument,
    #[serde(default)]
    pub rules: Vec<TargetRuleDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetRuleDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "match", default)]
    pub predicate: Option<TargetPredicate>,
    #[serde(default)]
    pub set: TargetDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BwsDocument {
    #[serde(default)]
    pub access_token_env: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    /// Environment name -> project name or id
    #[serde(default)]
    pub project_names: BTreeMap<String, String>,
    #[serde(default)]
    pub key_prefixes: KeyPrefixesDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyPrefixesDocument {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub shared: Option<String>,
}

// === Validated policy ===

/// Effective posture for one `(env, runtime_target, workload)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
    pub auth_mode: AuthMode,
    pub preflight_mode: PreflightMode,
    pub rule_id: Option<String>,
    pub runtime_target: String,
    pub workload: Option<String>,
    pub evidence_dir: PathBuf,
    pub record_fallback_evidence: bool,
}

impl Default for PolicyDecision {
    fn default() -> Self {
        Self {
            auth_mode: AuthMode::default(),
            preflight_mode: PreflightMode::default(),
            rule_id: None,
            runtime_target: "local".to_string(),
            workload: None,
            evidence_dir: PathBuf::from(DEFAULT_EVIDENCE_DIR),
            record_fallback_evidence: false,
        }
    }
}

/// Partial override of the auth posture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AuthOverrides {
    auth_mode: Option<AuthMode>,
    preflight_mode: Option<PreflightMode>,
    record_fallback_evidence: Option<bool>,
}

impl AuthOverrides {
    fn from_document(at: &str, doc: &AuthSettingsDocument) -> EnvgateResult<Self> {
        let auth_mode = doc
            .auth_mode
            .as_deref()
            .map(|m| m.trim().parse::<AuthMode>())
            .transpose()
            .map_err(|e| EnvgateError::schema(format!("{}.auth_mode", at), e))?;
        let preflight_mode = doc
            .preflight_mode
            .as_deref()
            .map(|m| m.trim().parse::<PreflightMode>())
            .transpose()
            .map_err(|e| EnvgateError::schema(format!("{}.preflight_mode", at), e))?;
        Ok(Self {
            auth_mode,
            preflight_mode,
            record_fallback_evidence: doc.record_fallback_evidence,
        })
    }
}

#[derive(Debug, Clone)]
struct AuthRule {
    id: String,
    predicate: Predicate,
    set: AuthOverrides,
}

impl PolicyRule for AuthRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

#[derive(Debug, Clone)]
struct TargetRule {
    id: String,
    predicate: Predicate,
    target: CloudTarget,
}

impl PolicyRule for TargetRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

/// bws backend settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BwsSettings {
    pub access_token_env: String,
    pub command: String,
    pub project_names: BTreeMap<String, String>,
    pub project_prefix: String,
    pub shared_prefix: String,
}

impl Default for BwsSettings {
    fn default() -> Self {
        Self {
            access_token_env: DEFAULT_BWS_TOKEN_ENV.to_string(),
            command: "bws".to_string(),
            project_names: BTreeMap::new(),
            project_prefix: "project/{env}/".to_string(),
            shared_prefix: "shared/".to_string(),
        }
    }
}

impl BwsSettings {
    fn from_document(doc: &BwsDocument) -> EnvgateResult<Self> {
        let defaults = Self::default();
        let non_empty = |at: &str, v: &Option<String>, fallback: String| match v {
            Some(s) if s.trim().is_empty() => {
                Err(EnvgateError::schema(at, "must not be empty"))
            }
            Some(s) => Ok(s.trim().to_string()),
            None => Ok(fallback),
        };
        Ok(Self {
            access_token_env: non_empty(
                "bws.access_token_env",
                &doc.access_token_env,
                defaults.access_token_env,
            )?,
            command: non_empty("bws.command", &doc.command, defaults.command)?,
            project_names: doc.project_names.clone(),
            project_prefix: non_empty(
                "bws.key_prefixes.project",
                &doc.key_prefixes.project,
                defaults.project_prefix,
            )?,
            shared_prefix: non_empty(
                "bws.key_prefixes.shared",
                &doc.key_prefixes.shared,
                defaults.shared_prefix,
            )?,
        })
    }

    /// Project configured for an environment, rejecting placeholders
    pub fn project_name_for(&self, env: &str) -> Result<&str, String> {
        let name = self
            .project_names
            .get(env)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| format!("bws.project_names.{} is not configured", env))?;
        if is_placeholder(name) {
            return Err(format!(
                "bws.project_names.{} is a placeholder ('{}'); set a real project",
                env, name
            ));
        }
        Ok(name)
    }

    /// Default key of a secret under the prefix of its scope
    pub fn key_for(&self, scope: BwsScope, env: &str, secret: &str) -> String {
        let prefix = match scope {
            BwsScope::Project => self.project_prefix.replace("{env}", env),
            BwsScope::Shared => self.shared_prefix.clone(),
        };
        format!("{}{}", prefix, secret)
    }
}

/// Whether a configured value is an unfilled template placeholder
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    (v.contains('<') && v.contains('>'))
        || v.eq_ignore_ascii_case("changeme")
        || v.eq_ignore_ascii_case("todo")
}

/// A validated policy
#[derive(Debug, Clone)]
pub struct Policy {
    auth_defaults: AuthOverrides,
    evidence_dir: PathBuf,
    auth_rules: Vec<AuthRule>,
    credential_chains: Vec<CredentialChain>,
    default_target: CloudTarget,
    target_rules: Vec<TargetRule>,
    bws: BwsSettings,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            auth_defaults: AuthOverrides::default(),
            evidence_dir: PathBuf::from(DEFAULT_EVIDENCE_DIR),
            auth_rules: Vec::new(),
            credential_chains: CredentialChain::builtin(),
            default_target: CloudTarget::default(),
            target_rules: Vec::new(),
            bws: BwsSettings::default(),
        }
    }
}

impl Policy {
    /// Validate a policy document. Every reachable target is validated here.
    pub fn from_document(doc: PolicyDocument) -> EnvgateResult<Self> {
        match doc.version {
            Some(POLICY_VERSION) => {}
            Some(other) => {
                return Err(EnvgateError::schema(
                    "version",
                    format!("unsupported policy version {} (expected 1)", other),
                ))
            }
            None => return Err(EnvgateError::schema("version", "version: 1 is required")),
        }

        let mut auth_defaults = AuthOverrides::from_document("auth.defaults", &doc.auth.defaults)?;
        if let Some(record) = doc.auth.record_fallback_evidence {
            if auth_defaults.record_fallback_evidence.is_some() {
                return Err(EnvgateError::schema(
                    "auth.record_fallback_evidence",
                    "set either auth.record_fallback_evidence or auth.defaults.record_fallback_evidence",
                ));
            }
            auth_defaults.record_fallback_evidence = Some(record);
        }

        let evidence_dir = match doc.auth.evidence_dir.as_deref().map(str::trim) {
            Some("") => {
                return Err(EnvgateError::schema(
                    "auth.evidence_dir",
                    "must not be empty",
                ))
            }
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(DEFAULT_EVIDENCE_DIR),
        };

        let mut seen = BTreeSet::new();
        let mut auth_rules = Vec::with_capacity(doc.auth.rules.len());
        for (i, rule) in doc.auth.rules.iter().enumerate() {
            let at = format!("auth.rules[{}]", i);
            let id = rule_id(&at, rule.id.as_deref(), &mut seen)?;
            let predicate = rule.predicate.clone().ok_or_else(|| {
                EnvgateError::schema(format!("{}.match", at), "match is required; use auth.defaults for a catch-all")
            })?;
            let set = AuthOverrides::from_document(&format!("{}.set", at), &rule.set)?;
            auth_rules.push(AuthRule { id, predicate, set });
        }

        let credential_chains = match doc.preflight.credential_chains {
            Some(chains) => {
                for (i, chain) in chains.iter().enumerate() {
                    chain.validate(&format!("preflight.credential_chains[{}]", i))?;
                }
                chains
            }
            None => CredentialChain::builtin(),
        };

        let default_target = CloudTarget::from_document("targets.defaults", &doc.targets.defaults)?;

        let mut seen = BTreeSet::new();
        let mut target_rules = Vec::with_capacity(doc.targets.rules.len());
        for (i, rule) in doc.targets.rules.iter().enumerate() {
            let at = format!("targets.rules[{}]", i);
            let id = rule_id(&at, rule.id.as_deref(), &mut seen)?;
            let predicate: Predicate = rule
                .predicate
                .clone()
                .ok_or_else(|| {
                    EnvgateError::schema(
                        format!("{}.match", at),
                        "match is required; use targets.defaults for a catch-all",
                    )
                })?
                .into();
            let merged = doc.targets.defaults.merged_with(&rule.set);
            let target = CloudTarget::from_document(&format!("{}.set", at), &merged)?;
            target_rules.push(TargetRule {
                id,
                predicate,
                target,
            });
        }

        Ok(Self {
            auth_defaults,
            evidence_dir,
            auth_rules,
            credential_chains,
            default_target,
            target_rules,
            bws: BwsSettings::from_document(&doc.bws)?,
        })
    }

    /// Select the delivery target for `(env, workload)`
    pub fn select_target(
        &self,
        env: &str,
        workload: Option<&str>,
    ) -> EnvgateResult<(CloudTarget, Option<String>)> {
        let input = MatchInput::new(env).with_workload(workload);
        Ok(match select_rule("targets", &self.target_rules, &input)? {
            Some(rule) => {
                tracing::debug!(env, rule = %rule.id, "target rule matched");
                (rule.target.clone(), Some(rule.id.clone()))
            }
            None => (self.default_target.clone(), None),
        })
    }

    /// Derive the auth posture for `(env, runtime_target, workload)`.
    ///
    /// A matched rule overrides only the fields its `set` block names.
    pub fn decide(
        &self,
        env: &str,
        runtime_target: &str,
        workload: Option<&str>,
    ) -> EnvgateResult<PolicyDecision> {
        let input = MatchInput::new(env)
            .with_runtime_target(runtime_target)
            .with_workload(workload);
        let matched = select_rule("auth", &self.auth_rules, &input)?;

        let defaults = &self.auth_defaults;
        let set = matched.map(|r| &r.set);

        let decision = PolicyDecision {
            auth_mode: set
                .and_then(|s| s.auth_mode)
                .or(defaults.auth_mode)
                .unwrap_or_default(),
            preflight_mode: set
                .and_then(|s| s.preflight_mode)
                .or(defaults.preflight_mode)
                .unwrap_or_default(),
            rule_id: matched.map(|r| r.id.clone()),
            runtime_target: runtime_target.to_string(),
            workload: workload.map(String::from),
            evidence_dir: self.evidence_dir.clone(),
            record_fallback_evidence: set
                .and_then(|s| s.record_fallback_evidence)
                .or(defaults.record_fallback_evidence)
                .unwrap_or(false),
        };
        tracing::debug!(
            env,
            runtime_target,
            auth_mode = %decision.auth_mode,
            preflight_mode = %decision.preflight_mode,
            rule = ?decision.rule_id,
            "auth posture decided"
        );
        Ok(decision)
    }

    pub fn credential_chains(&self) -> &[CredentialChain] {
        &self.credential_chains
    }

    pub fn bws(&self) -> &BwsSettings {
        &self.bws
    }
}

fn rule_id(at: &str, id: Option<&str>, seen: &mut BTreeSet<String>) -> EnvgateResult<String> {
    let id = id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| EnvgateError::schema(format!("{}.id", at), "id is required"))?;
    if !seen.insert(id.to_string()) {
        return Err(EnvgateError::schema(
            format!("{}.id", at),
            format!("duplicate rule id '{}'", id),
        ));
    }
    Ok(id.to_string())
}
