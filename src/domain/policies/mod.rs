//! Domain Policies
//!
//! Business rules that decide posture and placement: the rule matcher, the
//! policy document with its two rule sets, and the preflight scan.

mod policy;
mod preflight;
mod rule_matcher;

pub use policy::{
    is_placeholder, BwsSettings, Policy, PolicyDecision, PolicyDocument, DEFAULT_BWS_TOKEN_ENV,
    DEFAULT_EVIDENCE_DIR, POLICY_VERSION,
};
pub use preflight::{
    detect_signals, run_preflight, CredentialChain, PreflightOutcome, SignalSummary,
};
pub use rule_matcher::{select_rule, MatchInput, PolicyRule, Predicate, TargetPredicate};
