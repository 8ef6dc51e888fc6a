//! Property tests for specificity-ranked rule selection.

use proptest::prelude::*;

use envgate::domain::policies::{select_rule, MatchInput, PolicyRule, Predicate};
use envgate::EnvgateError;

#[derive(Debug)]
struct Rule {
    id: String,
    predicate: Predicate,
}

impl PolicyRule for Rule {
    fn id(&self) -> &str {
        &self.id
    }

    fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

fn name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Which of the three keys a predicate declares
fn key_mask() -> impl Strategy<Value = (bool, bool, bool)> {
    (any::<bool>(), any::<bool>(), any::<bool>())
}

fn predicate_for(mask: (bool, bool, bool), env: &str, runtime: &str, workload: &str) -> Predicate {
    Predicate {
        env: mask.0.then(|| env.to_string()),
        runtime_target: mask.1.then(|| runtime.to_string()),
        workload: mask.2.then(|| workload.to_string()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: two matching rules with identical predicates are always ambiguous.
    #[test]
    fn property_identical_matching_predicates_are_fatal(
        env in name(),
        runtime in name(),
        workload in name(),
        mask in key_mask(),
    ) {
        let predicate = predicate_for(mask, &env, &runtime, &workload);
        let rules = vec![
            Rule { id: "first".into(), predicate: predicate.clone() },
            Rule { id: "second".into(), predicate },
        ];
        let input = MatchInput::new(&env)
            .with_runtime_target(&runtime)
            .with_workload(Some(&workload));

        let err = select_rule("auth", &rules, &input).unwrap_err();
        let is_ambiguity = matches!(err, EnvgateError::PolicyAmbiguity { .. });
        prop_assert!(is_ambiguity);
    }

    /// PROPERTY: a matching strict superset of another matching predicate wins.
    #[test]
    fn property_strict_superset_wins(
        env in name(),
        runtime in name(),
        workload in name(),
        mask in key_mask(),
        extra in 0usize..3,
    ) {
        let narrow = predicate_for(mask, &env, &runtime, &workload);
        let mut wide_mask = mask;
        match extra {
            0 => wide_mask.0 = true,
            1 => wide_mask.1 = true,
            _ => wide_mask.2 = true,
        }
        prop_assume!(wide_mask != mask);
        let wide = predicate_for(wide_mask, &env, &runtime, &workload);

        let rules = vec![
            Rule { id: "narrow".into(), predicate: narrow },
            Rule { id: "wide".into(), predicate: wide },
        ];
        let input = MatchInput::new(&env)
            .with_runtime_target(&runtime)
            .with_workload(Some(&workload));

        let winner = select_rule("targets", &rules, &input).unwrap().unwrap();
        prop_assert_eq!(winner.id(), "wide");
    }

    /// PROPERTY: rules naming another environment never match.
    #[test]
    fn property_other_env_never_matches(env in name(), other in name()) {
        prop_assume!(env != other);
        let rules = vec![Rule {
            id: "other".into(),
            predicate: Predicate { env: Some(other), ..Predicate::default() },
        }];

        let selected = select_rule("targets", &rules, &MatchInput::new(&env)).unwrap();
        prop_assert!(selected.is_none());
    }
}
