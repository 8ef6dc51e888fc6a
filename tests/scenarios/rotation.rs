//! Scenario: rotate a mock secret after the first apply.
//!
//! Steps:
//! 1. first apply creates the record (CREATE, version 1)
//! 2. rotate bumps the version to 2 and moves the rotation time
//! 3. the next plan is NOOP: rotation is not a config change

use crate::common::*;

#[test]
fn scenario_create_then_rotate() {
    let env = TestEnv::new();
    env.mock_secret("dev", "db_password", SECRET_VALUE);

    let apply = env.run(&["apply", "dev", "--approve", "--json"]);
    assert_success(&apply);
    assert_eq!(apply.json()["status"], "CREATE");
    let before = env.record("mockcloud", "dev");
    assert_eq!(before["secrets"]["db_password"]["version"], 1);

    let rotate = env.run(&["rotate", "dev", "db_password", "--approve", "--json"]);
    assert_success(&rotate);
    assert_eq!(rotate.json()["version"], 2);

    let after = env.record("mockcloud", "dev");
    assert_eq!(after["secrets"]["db_password"]["version"], 2);
    assert_ne!(
        after["secrets"]["db_password"]["rotated_at"],
        before["secrets"]["db_password"]["rotated_at"]
    );
    assert_eq!(after["config"], before["config"]);

    let backing = env.read(".envgate/mockcloud/dev/secrets/db_password");
    assert_ne!(backing.trim(), SECRET_VALUE);

    let plan = env.run(&["plan", "dev", "--json"]);
    assert_success(&plan);
    assert_eq!(plan.json()["status"], "NOOP");
}

#[test]
fn scenario_rotate_without_record_changes_nothing() {
    let env = TestEnv::new();
    env.mock_secret("dev", "db_password", SECRET_VALUE);

    let rotate = env.run(&["rotate", "dev", "db_password", "--approve"]);

    assert_eq!(rotate.exit_code, 1);
    assert!(rotate.stderr.contains("apply first"), "{}", rotate.stderr);
    assert_eq!(
        env.read(".envgate/mockcloud/dev/secrets/db_password").trim(),
        SECRET_VALUE
    );
}
