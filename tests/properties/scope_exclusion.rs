//! Property tests for environment scopes.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::Value;

use envgate::domain::entities::{Contract, ContractDocument};
use envgate::domain::policies::Policy;
use envgate::domain::services::{build_desired_state, BuildInputs};
use envgate::infrastructure::parse_document;
use envgate::EnvgateError;

const ENVS: [&str; 3] = ["dev", "staging", "prod"];

/// Per variable: the environments it is scoped to (`None` = everywhere)
fn scopes() -> impl Strategy<Value = Vec<Option<Vec<bool>>>> {
    proptest::collection::vec(
        proptest::option::of(
            proptest::collection::vec(any::<bool>(), 3)
                .prop_filter("scopes must not be empty", |m| m.iter().any(|b| *b)),
        ),
        1..6,
    )
}

fn contract_yaml(scopes: &[Option<Vec<bool>>]) -> String {
    let mut out = String::from("variables:\n  APP_ENV: { type: string, required: true }\n");
    for (i, scope) in scopes.iter().enumerate() {
        out.push_str(&format!("  VAR_{}:\n    type: string\n    default: v{}\n", i, i));
        if let Some(mask) = scope {
            let envs: Vec<&str> = ENVS
                .iter()
                .zip(mask)
                .filter(|(_, on)| **on)
                .map(|(e, _)| *e)
                .collect();
            out.push_str(&format!("    scopes: [{}]\n", envs.join(", ")));
        }
    }
    out
}

fn in_scope(scope: &Option<Vec<bool>>, env_index: usize) -> bool {
    scope.as_ref().map_or(true, |mask| mask[env_index])
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a variable appears in the config exactly when it is in scope.
    #[test]
    fn property_out_of_scope_variables_never_appear(
        scopes in scopes(),
        env_index in 0usize..3,
    ) {
        let doc: ContractDocument =
            parse_document(&contract_yaml(&scopes), "contract.yaml", "").unwrap();
        let contract = Contract::from_document(doc).unwrap();
        let policy = Policy::default();
        let env = ENVS[env_index];
        let values = BTreeMap::new();
        let secret_refs = BTreeMap::new();

        let desired = build_desired_state(&BuildInputs {
            env,
            workload: None,
            contract: &contract,
            values: &values,
            secret_refs: &secret_refs,
            policy: &policy,
            env_selector: "APP_ENV",
            file_exists: &|_| false,
        })
        .unwrap();

        for (i, scope) in scopes.iter().enumerate() {
            let key = format!("VAR_{}", i);
            prop_assert_eq!(
                desired.config.contains_key(&key),
                in_scope(scope, env_index),
                "{} in {}", key, env
            );
        }
    }

    /// PROPERTY: setting an out-of-scope variable in the values overlay is fatal.
    #[test]
    fn property_out_of_scope_value_is_rejected(
        scopes in scopes(),
        env_index in 0usize..3,
        pick in any::<prop::sample::Index>(),
    ) {
        let i = pick.index(scopes.len());
        prop_assume!(!in_scope(&scopes[i], env_index));

        let doc: ContractDocument =
            parse_document(&contract_yaml(&scopes), "contract.yaml", "").unwrap();
        let contract = Contract::from_document(doc).unwrap();
        let policy = Policy::default();
        let mut values = BTreeMap::new();
        values.insert(format!("VAR_{}", i), Value::from("override"));
        let secret_refs = BTreeMap::new();

        let err = build_desired_state(&BuildInputs {
            env: ENVS[env_index],
            workload: None,
            contract: &contract,
            values: &values,
            secret_refs: &secret_refs,
            policy: &policy,
            env_selector: "APP_ENV",
            file_exists: &|_| false,
        })
        .unwrap_err();

        let is_scope_error = matches!(err, EnvgateError::ScopeOrLifecycle { .. });
        prop_assert!(is_scope_error);
    }
}
