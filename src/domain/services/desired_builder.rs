//! Desired-State Builder
//!
//! Merges contract defaults, the per-environment values overlay and the
//! secret-reference document into a [`DesiredState`]. The result never holds
//! a secret value; secrets appear as `{backend, stable_ref}` only.
//!
//! Merge order:
//! 1. defaults of live, non-secret variables
//! 2. values overlay (aliases resolved, lifecycle and type checked)
//! 3. secret references of live secret variables
//! 4. environment selector forced to the environment name
//! 5. required-value check
//! 6. preflight over the map with secrets redacted

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::entities::{Contract, DesiredState, SecretBackendConfig, SecretRef};
use crate::domain::policies::{run_preflight, Policy};
use crate::domain::value_objects::REDACTED;
use crate::error::{EnvgateError, EnvgateResult};

/// Default name of the environment-selector variable
pub const DEFAULT_ENV_SELECTOR: &str = "APP_ENV";

/// Everything the builder reads
pub struct BuildInputs<'a> {
    pub env: &'a str,
    pub workload: Option<&'a str>,
    pub contract: &'a Contract,
    pub values: &'a BTreeMap<String, Value>,
    pub secret_refs: &'a BTreeMap<String, SecretBackendConfig>,
    pub policy: &'a Policy,
    pub env_selector: &'a str,
    /// Existence check for configured credential files
    pub file_exists: &'a dyn Fn(&str) -> bool,
}

/// Build the desired state of one environment
pub fn build_desired_state(inputs: &BuildInputs<'_>) -> EnvgateResult<DesiredState> {
    let BuildInputs {
        env,
        workload,
        contract,
        values,
        secret_refs,
        policy,
        env_selector,
        file_exists,
    } = *inputs;

    let (target, target_rule) = policy.select_target(env, workload)?;
    let decision = policy.decide(env, &target.runtime, workload)?;

    let mut config: BTreeMap<String, Value> = BTreeMap::new();
    let mut warnings = Vec::new();

    // 1. defaults
    for var in contract.live_in(env).filter(|v| !v.is_secret()) {
        if let Some(default) = &var.default {
            config.insert(var.name.clone(), default.clone());
        }
    }

    // 2. overlay
    for (key, value) in values {
        let canonical = canonical_key(contract, key)?;
        if canonical != key.as_str() {
            if values.contains_key(canonical) {
                return Err(EnvgateError::lifecycle(
                    key.as_str(),
                    format!(
                        "both the legacy key {} and its replacement {} are set; remove {}",
                        key, canonical, key
                    ),
                ));
            }
            warnings.push(format!(
                "{} is a legacy name for {} (migration.rename_from); rename it in values/{}.yaml",
                key, canonical, env
            ));
        }

        let Some(var) = contract.get(canonical) else {
            return Err(EnvgateError::lifecycle(
                key.as_str(),
                "not declared in the contract",
            ));
        };
        if var.is_removed() {
            return Err(EnvgateError::lifecycle(
                key.as_str(),
                "variable is removed from the contract",
            ));
        }
        if var.is_secret() {
            return Err(EnvgateError::lifecycle(
                key.as_str(),
                format!(
                    "secret variables must not appear in values files; reference them from secrets/{}.yaml",
                    env
                ),
            ));
        }
        if !var.in_scope(env) {
            return Err(EnvgateError::lifecycle(
                key.as_str(),
                format!("not in scope for environment '{}'", env),
            ));
        }
        if let Some(notice) = var.deprecation_notice() {
            warnings.push(notice);
        }
        var.check_value(value)
            .map_err(|e| EnvgateError::schema(format!("values.{}", key), e))?;

        config.insert(canonical.to_string(), value.clone());
    }

    // 3. secret references
    let mut secrets = BTreeMap::new();
    let mut secret_vars = BTreeMap::new();
    let mut secret_backends = BTreeMap::new();
    for var in contract.live_in(env) {
        let Some(secret) = &var.secret_ref else {
            continue;
        };
        let backend = secret_refs.get(secret).ok_or_else(|| {
            EnvgateError::secret(
                secret.as_str(),
                format!(
                    "required by {} but missing from secrets/{}.yaml",
                    var.name, env
                ),
            )
        })?;
        secrets.insert(
            secret.clone(),
            SecretRef {
                backend: backend.kind(),
                stable_ref: backend.stable_ref(secret, env),
            },
        );
        secret_backends.insert(secret.clone(), backend.clone());
        secret_vars.insert(var.name.clone(), secret.clone());
    }

    // 4. environment selector
    if let Some(selector) = contract.get(env_selector) {
        if !selector.is_removed() && !selector.is_secret() {
            config.insert(selector.name.clone(), Value::String(env.to_string()));
        }
    }

    // 5. required values
    for var in contract.live_in(env).filter(|v| v.required && !v.is_secret()) {
        let present = match config.get(&var.name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(EnvgateError::lifecycle(
                var.name.as_str(),
                format!("required but has no value for environment '{}'", env),
            ));
        }
    }

    let mut desired = DesiredState {
        env: env.to_string(),
        provider: target.provider,
        runtime: target.runtime.clone(),
        config,
        secrets,
        secret_vars,
        warnings,
        decision,
        target_rule,
        preflight: None,
        record_evidence: false,
        target,
        secret_backends,
    };

    // 6. preflight
    let effective = desired.redacted_view(REDACTED);
    let outcome = run_preflight(
        &desired.decision,
        policy.credential_chains(),
        &effective,
        file_exists,
    )?;
    desired.warnings.extend(outcome.warnings);
    desired.preflight = outcome.summary;
    desired.record_evidence = outcome.record_evidence;

    for warning in &desired.warnings {
        tracing::debug!(env, "{}", warning);
    }
    Ok(desired)
}

/// Resolve a values key to its canonical variable name.
///
/// A key naming a removed variable that is also a rename alias resolves
/// through the alias.
fn canonical_key<'a>(contract: &'a Contract, key: &'a str) -> EnvgateResult<&'a str> {
    match contract.get(key) {
        Some(var) if !var.is_removed() => Ok(key),
        found => match contract.resolve_alias(key) {
            Some(canonical) => Ok(canonical),
            None if found.is_some() => Ok(key),
            None => Err(EnvgateError::lifecycle(key, "not declared in the contract")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{parse_secret_refs, BackendKind, ContractDocument};
    use crate::domain::policies::PolicyDocument;
    use crate::domain::value_objects::Provider;

    const CONTRACT: &str = r#"
variables:
  APP_ENV: { type: enum, values: [dev, staging, prod], required: true, default: dev }
  PORT: { type: int, default: 8080 }
  LOG_LEVEL: { type: string, state: deprecated, deprecate_after: "2026-12-31", replacement: RUST_LOG }
  RUST_LOG: { type: string, default: info }
  DEBUG_TOOLBAR: { type: bool, scopes: [dev] }
  SERVICE_URL: { type: url, migration: { rename_from: API_URL } }
  API_URL: { type: url, state: removed }
  OLD_FLAG: { type: bool, state: removed }
  REQUIRED_NAME: { type: string, required: true }
  DB_PASSWORD: { secret: true, secret_ref: db_password }
"#;

    struct Fixture {
        contract: Contract,
        policy: Policy,
        secrets: BTreeMap<String, SecretBackendConfig>,
    }

    fn fixture(policy_yaml: &str) -> Fixture {
        let doc: ContractDocument = serde_yaml_ng::from_str(CONTRACT).unwrap();
        let policy: PolicyDocument = serde_yaml_ng::from_str(policy_yaml).unwrap();
        Fixture {
            contract: Contract::from_document(doc).unwrap(),
            policy: Policy::from_document(policy).unwrap(),
            secrets: parse_secret_refs(
                serde_yaml_ng::from_str("db_password: { backend: mock }\n").unwrap(),
            )
            .unwrap(),
        }
    }

    fn values(yaml: &str) -> BTreeMap<String, Value> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn build(f: &Fixture, env: &str, vals: &BTreeMap<String, Value>) -> EnvgateResult<DesiredState> {
        build_desired_state(&BuildInputs {
            env,
            workload: None,
            contract: &f.contract,
            values: vals,
            secret_refs: &f.secrets,
            policy: &f.policy,
            env_selector: DEFAULT_ENV_SELECTOR,
            file_exists: &|_| false,
        })
    }

    #[test]
    fn merges_defaults_values_and_secret_refs() {
        let f = fixture("version: 1\n");
        let d = build(&f, "dev", &values("REQUIRED_NAME: api\nPORT: 9000\n")).unwrap();

        assert_eq!(d.provider, Provider::MockCloud);
        assert_eq!(d.config["PORT"], Value::from(9000));
        assert_eq!(d.config["RUST_LOG"], Value::from("info"));
        assert!(!d.config.contains_key("DB_PASSWORD"));
        assert_eq!(d.secrets["db_password"].backend, BackendKind::Mock);
        assert_eq!(d.secrets["db_password"].stable_ref, "mock:dev/db_password");
        assert_eq!(d.secret_vars["DB_PASSWORD"], "db_password");
    }

    #[test]
    fn env_selector_always_equals_env() {
        let f = fixture("version: 1\n");
        let d = build(&f, "prod", &values("REQUIRED_NAME: x\nAPP_ENV: dev\n")).unwrap();
        assert_eq!(d.config["APP_ENV"], Value::from("prod"));
    }

    #[test]
    fn out_of_scope_variables_are_excluded_and_rejected() {
        let f = fixture("version: 1\n");
        let d = build(&f, "prod", &values("REQUIRED_NAME: x\n")).unwrap();
        assert!(!d.config.contains_key("DEBUG_TOOLBAR"));

        let err = build(&f, "prod", &values("REQUIRED_NAME: x\nDEBUG_TOOLBAR: true\n")).unwrap_err();
        assert!(err.to_string().contains("not in scope"));
    }

    #[test]
    fn legacy_alias_populates_new_key_with_warning() {
        let f = fixture("version: 1\n");
        let d = build(
            &f,
            "dev",
            &values("REQUIRED_NAME: x\nAPI_URL: https://api.example.com\n"),
        )
        .unwrap();
        assert_eq!(d.config["SERVICE_URL"], Value::from("https://api.example.com"));
        assert!(!d.config.contains_key("API_URL"));
        assert!(d.warnings.iter().any(|w| w.contains("API_URL is a legacy name")));
    }

    #[test]
    fn legacy_and_canonical_together_is_fatal() {
        let f = fixture("version: 1\n");
        let err = build(
            &f,
            "dev",
            &values("REQUIRED_NAME: x\nAPI_URL: https://a.example\nSERVICE_URL: https://b.example\n"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("both the legacy key API_URL"));
    }

    #[test]
    fn removed_unknown_and_secret_keys_are_rejected() {
        let f = fixture("version: 1\n");
        for (yaml, needle) in [
            ("OLD_FLAG: true\n", "removed"),
            ("NOPE: 1\n", "not declared"),
            ("DB_PASSWORD: hunter2\n", "must not appear in values"),
        ] {
            let err = build(&f, "dev", &values(&format!("REQUIRED_NAME: x\n{}", yaml))).unwrap_err();
            assert!(err.to_string().contains(needle), "{}: {}", yaml, err);
            assert!(!err.to_string().contains("hunter2"));
        }
    }

    #[test]
    fn deprecated_keys_warn_with_date_and_replacement() {
        let f = fixture("version: 1\n");
        let d = build(&f, "dev", &values("REQUIRED_NAME: x\nLOG_LEVEL: debug\n")).unwrap();
        assert!(d
            .warnings
            .iter()
            .any(|w| w == "LOG_LEVEL is deprecated after 2026-12-31; use RUST_LOG instead"));
    }

    #[test]
    fn type_mismatch_is_fatal() {
        let f = fixture("version: 1\n");
        let err = build(&f, "dev", &values("REQUIRED_NAME: x\nPORT: eighty\n")).unwrap_err();
        assert!(err.to_string().contains("values.PORT"));
    }

    #[test]
    fn missing_required_value_is_fatal() {
        let f = fixture("version: 1\n");
        let err = build(&f, "dev", &values("REQUIRED_NAME: \"\"\n")).unwrap_err();
        assert!(err.to_string().contains("REQUIRED_NAME"));
    }

    #[test]
    fn missing_secret_reference_is_fatal() {
        let mut f = fixture("version: 1\n");
        f.secrets.clear();
        let err = build(&f, "dev", &values("REQUIRED_NAME: x\n")).unwrap_err();
        assert!(matches!(err, EnvgateError::SecretResolution { .. }));
    }

    #[test]
    fn preflight_sees_redacted_secrets() {
        let doc: ContractDocument = serde_yaml_ng::from_str(
            r#"
variables:
  AWS_ACCESS_KEY_ID: { type: string, default: AKIAEXAMPLE }
  AWS_SECRET_ACCESS_KEY: { secret: true, secret_ref: aws_secret }
"#,
        )
        .unwrap();
        let policy: PolicyDocument = serde_yaml_ng::from_str(
            "version: 1\nauth:\n  defaults: { auth_mode: role-only, preflight_mode: fail }\n",
        )
        .unwrap();
        let contract = Contract::from_document(doc).unwrap();
        let policy = Policy::from_document(policy).unwrap();
        let secrets =
            parse_secret_refs(serde_yaml_ng::from_str("aws_secret: { backend: mock }\n").unwrap())
                .unwrap();

        let err = build_desired_state(&BuildInputs {
            env: "prod",
            workload: None,
            contract: &contract,
            values: &BTreeMap::new(),
            secret_refs: &secrets,
            policy: &policy,
            env_selector: DEFAULT_ENV_SELECTOR,
            file_exists: &|_| false,
        })
        .unwrap_err();
        assert!(matches!(err, EnvgateError::Preflight { .. }));
    }

    #[test]
    fn target_runtime_feeds_the_auth_pass() {
        let f = fixture(
            r#"
version: 1
auth:
  rules:
    - { id: ecs-strict, match: { runtime_target: ecs }, set: { preflight_mode: fail } }
targets:
  rules:
    - id: prod
      match: { env: prod }
      set: { provider: envfile, runtime: ecs, transport: { kind: local, dir: /srv/app } }
"#,
        );
        let d = build(&f, "prod", &values("REQUIRED_NAME: x\n")).unwrap();
        assert_eq!(d.runtime, "ecs");
        assert_eq!(d.decision.rule_id.as_deref(), Some("ecs-strict"));
        assert_eq!(d.target_rule.as_deref(), Some("prod"));
    }
}
