//! Scenario: a referenced mock secret has no backing file.
//!
//! Plan and apply both fail, name the file to create, and write no record.
//! Creating the file unblocks the apply.

use crate::common::*;

#[test]
fn scenario_missing_mock_secret_blocks_plan_and_apply() {
    let env = TestEnv::new();
    let expected = env.path(".envgate/mockcloud/dev/secrets/db_password");

    let plan = env.run(&["plan", "dev"]);
    assert_eq!(plan.exit_code, 1);
    assert!(
        plan.stderr.contains(&expected.display().to_string()),
        "error should name the missing file:\n{}",
        plan.stderr
    );

    let apply = env.run(&["apply", "dev", "--approve"]);
    assert_eq!(apply.exit_code, 1);
    assert!(apply.stderr.contains("mock secret missing"));
    assert!(!env.record_path("mockcloud", "dev").exists());

    env.mock_secret("dev", "db_password", SECRET_VALUE);
    assert_success(&env.run(&["apply", "dev", "--approve"]));
    assert!(env.record_path("mockcloud", "dev").exists());
}
