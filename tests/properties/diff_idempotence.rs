//! Property tests for the desired-state diff.

use std::collections::BTreeMap;

use chrono::Utc;
use proptest::prelude::*;
use serde_json::Value;

use envgate::domain::entities::{Contract, ContractDocument, DeployedState};
use envgate::domain::policies::Policy;
use envgate::domain::services::{build_desired_state, diff_state, BuildInputs, PlanStatus};
use envgate::infrastructure::parse_document;

const CONTRACT: &str = r#"
variables:
  APP_ENV: { type: string, required: true }
  REGION: { type: string, default: eu-west-1 }
  WORKERS: { type: int, default: 2 }
  FEATURE_X: { type: bool }
  BANNER: { type: string }
"#;

fn contract() -> Contract {
    let doc: ContractDocument = parse_document(CONTRACT, "contract.yaml", "").unwrap();
    Contract::from_document(doc).unwrap()
}

fn overlay() -> impl Strategy<Value = BTreeMap<String, Value>> {
    (
        proptest::option::of("[a-z]{2}-[a-z]{4}-[1-9]"),
        proptest::option::of(0i64..512),
        proptest::option::of(any::<bool>()),
        proptest::option::of("[ -~]{0,24}"),
    )
        .prop_map(|(region, workers, feature, banner)| {
            let mut values = BTreeMap::new();
            if let Some(v) = region {
                values.insert("REGION".to_string(), Value::from(v));
            }
            if let Some(v) = workers {
                values.insert("WORKERS".to_string(), Value::from(v));
            }
            if let Some(v) = feature {
                values.insert("FEATURE_X".to_string(), Value::from(v));
            }
            if let Some(v) = banner {
                values.insert("BANNER".to_string(), Value::from(v));
            }
            values
        })
}

fn build(contract: &Contract, policy: &Policy, env: &str, values: &BTreeMap<String, Value>) -> envgate::domain::entities::DesiredState {
    let secret_refs = BTreeMap::new();
    build_desired_state(&BuildInputs {
        env,
        workload: None,
        contract,
        values,
        secret_refs: &secret_refs,
        policy,
        env_selector: "APP_ENV",
        file_exists: &|_| false,
    })
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: recording a desired state and diffing again is always NOOP.
    #[test]
    fn property_recorded_state_diffs_to_noop(
        env in "[a-z][a-z0-9-]{0,8}",
        values in overlay(),
    ) {
        let contract = contract();
        let policy = Policy::default();
        let desired = build(&contract, &policy, &env, &values);

        let first = diff_state(&desired, None);
        prop_assert_eq!(first.status, PlanStatus::Create);

        let record = DeployedState::from_desired(&desired, None, Utc::now());
        let second = diff_state(&desired, Some(&record));
        prop_assert!(second.is_noop(), "second diff: {}", second.summary());

        // Re-recording over the previous record stays NOOP as well
        let again = DeployedState::from_desired(&desired, Some(&record), Utc::now());
        prop_assert!(diff_state(&desired, Some(&again)).is_noop());
    }

    /// PROPERTY: any change of the overlay shows up as UPDATE, never CREATE or NOOP.
    #[test]
    fn property_changed_overlay_is_update(
        before in overlay(),
        after in overlay(),
    ) {
        let contract = contract();
        let policy = Policy::default();
        let old = build(&contract, &policy, "dev", &before);
        let new = build(&contract, &policy, "dev", &after);
        prop_assume!(old.config != new.config);

        let record = DeployedState::from_desired(&old, None, Utc::now());
        let diff = diff_state(&new, Some(&record));

        prop_assert_eq!(diff.status, PlanStatus::Update);
        prop_assert!(!diff.config.is_empty());
    }
}
