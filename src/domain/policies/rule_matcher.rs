//! Specificity-ranked rule matching
//!
//! Both policy rule sets use the same algorithm. A rule matches when every
//! predicate key it declares equals the corresponding input; its specificity
//! is the number of keys it declares. The most specific match wins and a tie
//! at the top is an error, never an arbitrary pick.

use serde::Deserialize;

use crate::error::{EnvgateError, EnvgateResult};

/// Inputs a rule predicate is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchInput<'a> {
    pub env: &'a str,
    pub runtime_target: Option<&'a str>,
    pub workload: Option<&'a str>,
}

impl<'a> MatchInput<'a> {
    pub fn new(env: &'a str) -> Self {
        Self {
            env,
            runtime_target: None,
            workload: None,
        }
    }

    pub fn with_runtime_target(mut self, runtime_target: &'a str) -> Self {
        self.runtime_target = Some(runtime_target);
        self
    }

    pub fn with_workload(mut self, workload: Option<&'a str>) -> Self {
        self.workload = workload;
        self
    }
}

/// Predicate of an auth rule: `{env, runtime_target, workload}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub runtime_target: Option<String>,
    #[serde(default)]
    pub workload: Option<String>,
}

/// Predicate of a target rule: `{env, workload}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetPredicate {
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub workload: Option<String>,
}

impl From<TargetPredicate> for Predicate {
    fn from(p: TargetPredicate) -> Self {
        Predicate {
            env: p.env,
            runtime_target: None,
            workload: p.workload,
        }
    }
}

impl Predicate {
    /// Number of declared keys
    pub fn specificity(&self) -> usize {
        [&self.env, &self.runtime_target, &self.workload]
            .iter()
            .filter(|k| k.is_some())
            .count()
    }

    /// Whether every declared key equals its input.
    ///
    /// A declared key whose input is absent never matches.
    pub fn matches(&self, input: &MatchInput<'_>) -> bool {
        fn key_matches(declared: &Option<String>, actual: Option<&str>) -> bool {
            match declared {
                None => true,
                Some(want) => actual.is_some_and(|got| got == want.trim()),
            }
        }

        key_matches(&self.env, Some(input.env))
            && key_matches(&self.runtime_target, input.runtime_target)
            && key_matches(&self.workload, input.workload)
    }
}

/// A rule that can take part in selection
pub trait PolicyRule {
    fn id(&self) -> &str;
    fn predicate(&self) -> &Predicate;
}

/// Select the single most specific matching rule.
///
/// Returns `Ok(None)` when nothing matches.
pub fn select_rule<'r, R: PolicyRule>(
    rule_set: &str,
    rules: &'r [R],
    input: &MatchInput<'_>,
) -> EnvgateResult<Option<&'r R>> {
    let matching: Vec<(usize, &R)> = rules
        .iter()
        .filter(|r| r.predicate().matches(input))
        .map(|r| (r.predicate().specificity(), r))
        .collect();

    let Some(top) = matching.iter().map(|(s, _)| *s).max() else {
        return Ok(None);
    };

    let winners: Vec<&R> = matching
        .into_iter()
        .filter(|(s, _)| *s == top)
        .map(|(_, r)| r)
        .collect();

    match winners.as_slice() {
        [only] => Ok(Some(*only)),
        tied => Err(EnvgateError::PolicyAmbiguity {
            rule_set: rule_set.to_string(),
            specificity: top,
            rules: tied.iter().map(|r| r.id().to_string()).collect(),
        }),
    }
}
