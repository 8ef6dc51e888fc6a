//! Differ Domain Service
//!
//! Computes the reconciliation status between a desired state and the last
//! deployed record. Pure: no I/O, safe to call repeatedly.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::domain::entities::{DeployedState, DesiredState, SecretRef};
use crate::domain::value_objects::Provider;

/// Reconciliation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    /// No deployed record yet
    Create,
    /// Deployed record differs
    Update,
    /// Nothing to do
    Noop,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanStatus::Create => "CREATE",
            PlanStatus::Update => "UPDATE",
            PlanStatus::Noop => "NOOP",
        })
    }
}

/// A value that changed between deployed and desired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change<T> {
    pub from: T,
    pub to: T,
}

/// Key-wise difference of two maps; all buckets are key-sorted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDiff<T> {
    pub added: BTreeMap<String, T>,
    pub removed: BTreeMap<String, T>,
    pub changed: BTreeMap<String, Change<T>>,
}

impl<T> Default for MapDiff<T> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            changed: BTreeMap::new(),
        }
    }
}

impl<T: Clone + PartialEq> MapDiff<T> {
    /// Diff `old` (deployed) against `new` (desired)
    pub fn between(old: &BTreeMap<String, T>, new: &BTreeMap<String, T>) -> Self {
        let mut diff = Self::default();
        for (key, value) in new {
            match old.get(key) {
                None => {
                    diff.added.insert(key.clone(), value.clone());
                }
                Some(previous) if previous != value => {
                    diff.changed.insert(
                        key.clone(),
                        Change {
                            from: previous.clone(),
                            to: value.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }
        for (key, value) in old {
            if !new.contains_key(key) {
                diff.removed.insert(key.clone(), value.clone());
            }
        }
        diff
    }

    /// Everything in `new` as an addition
    pub fn all_added(new: &BTreeMap<String, T>) -> Self {
        Self {
            added: new.clone(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Number of keys touched
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Result of comparing desired and deployed state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDiff {
    pub env: String,
    pub provider: Provider,
    pub status: PlanStatus,
    pub config: MapDiff<Value>,
    pub secrets: MapDiff<SecretRef>,
}

impl StateDiff {
    pub fn is_noop(&self) -> bool {
        self.status == PlanStatus::Noop
    }

    /// One-line summary, e.g. `UPDATE (config +1 ~2, secrets -1)`
    pub fn summary(&self) -> String {
        fn bucket(name: &str, added: usize, changed: usize, removed: usize) -> Option<String> {
            let parts: Vec<String> = [("+", added), ("~", changed), ("-", removed)]
                .iter()
                .filter(|(_, n)| *n > 0)
                .map(|(sign, n)| format!("{}{}", sign, n))
                .collect();
            (!parts.is_empty()).then(|| format!("{} {}", name, parts.join(" ")))
        }

        let buckets: Vec<String> = [
            bucket(
                "config",
                self.config.added.len(),
                self.config.changed.len(),
                self.config.removed.len(),
            ),
            bucket(
                "secrets",
                self.secrets.added.len(),
                self.secrets.changed.len(),
                self.secrets.removed.len(),
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        if buckets.is_empty() {
            self.status.to_string()
        } else {
            format!("{} ({})", self.status, buckets.join(", "))
        }
    }
}

/// Compare desired state with the deployed record.
///
/// Deployed secret metadata is reduced to `{backend, stable_ref}` first, so
/// version and rotation time never produce a difference.
pub fn diff_state(desired: &DesiredState, deployed: Option<&DeployedState>) -> StateDiff {
    let Some(deployed) = deployed else {
        return StateDiff {
            env: desired.env.clone(),
            provider: desired.provider,
            status: PlanStatus::Create,
            config: MapDiff::all_added(&desired.config),
            secrets: MapDiff::all_added(&desired.secrets),
        };
    };

    let deployed_secrets: BTreeMap<String, SecretRef> = deployed
        .secrets
        .iter()
        .map(|(name, meta)| (name.clone(), meta.stable()))
        .collect();

    let config = MapDiff::between(&deployed.config, &desired.config);
    let secrets = MapDiff::between(&deployed_secrets, &desired.secrets);
    let status = if config.is_empty() && secrets.is_empty() {
        PlanStatus::Noop
    } else {
        PlanStatus::Update
    };

    StateDiff {
        env: desired.env.clone(),
        provider: desired.provider,
        status,
        config,
        secrets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{BackendKind, CloudTarget};
    use crate::domain::policies::PolicyDecision;
    use chrono::{TimeZone, Utc};

    fn desired(config: &[(&str, Value)], secrets: &[(&str, &str)]) -> DesiredState {
        DesiredState {
            env: "dev".to_string(),
            provider: Provider::MockCloud,
            runtime: "local".to_string(),
            config: config
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            secrets: secrets
                .iter()
                .map(|(k, r)| {
                    (
                        k.to_string(),
                        SecretRef {
                            backend: BackendKind::Mock,
                            stable_ref: r.to_string(),
                        },
                    )
                })
                .collect(),
            secret_vars: BTreeMap::new(),
            warnings: vec![],
            decision: PolicyDecision::default(),
            target_rule: None,
            preflight: None,
            record_evidence: false,
            target: CloudTarget::default(),
            secret_backends: BTreeMap::new(),
        }
    }

    fn deploy(d: &DesiredState) -> DeployedState {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        DeployedState::from_desired(d, None, at)
    }

    #[test]
    fn no_record_is_create_with_everything_added() {
        let d = desired(&[("PORT", Value::from(80))], &[("db", "mock:dev/db")]);
        let diff = diff_state(&d, None);
        assert_eq!(diff.status, PlanStatus::Create);
        assert_eq!(diff.config.added.len(), 1);
        assert_eq!(diff.secrets.added.len(), 1);
        assert!(diff.config.removed.is_empty());
    }

    #[test]
    fn unchanged_state_is_noop() {
        let d = desired(&[("PORT", Value::from(80))], &[("db", "mock:dev/db")]);
        let record = deploy(&d);
        let diff = diff_state(&d, Some(&record));
        assert!(diff.is_noop());
        assert_eq!(diff.summary(), "NOOP");
    }

    #[test]
    fn secret_version_bumps_do_not_diff() {
        let d = desired(&[], &[("db", "mock:dev/db")]);
        let mut record = deploy(&d);
        let later = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        record.bump_secret("db", later).unwrap();
        assert!(diff_state(&d, Some(&record)).is_noop());
    }

    #[test]
    fn buckets_are_independent_and_sorted() {
        let old = desired(
            &[("A", Value::from(1)), ("B", Value::from(2))],
            &[("db", "mock:dev/db")],
        );
        let record = deploy(&old);
        let new = desired(
            &[("B", Value::from(3)), ("C", Value::from(4))],
            &[("db", "env:DB_PASSWORD")],
        );

        let diff = diff_state(&new, Some(&record));
        assert_eq!(diff.status, PlanStatus::Update);
        assert_eq!(diff.config.added.keys().collect::<Vec<_>>(), vec!["C"]);
        assert_eq!(diff.config.removed.keys().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(diff.config.changed["B"].from, Value::from(2));
        assert_eq!(diff.config.changed["B"].to, Value::from(3));
        assert_eq!(diff.secrets.changed["db"].to.stable_ref, "env:DB_PASSWORD");
        assert_eq!(diff.summary(), "UPDATE (config +1 ~1 -1, secrets ~1)");
    }

    #[test]
    fn diff_serializes_with_upper_case_status() {
        let d = desired(&[], &[]);
        let json = serde_json::to_value(diff_state(&d, None)).unwrap();
        assert_eq!(json["status"], "CREATE");
    }
}
