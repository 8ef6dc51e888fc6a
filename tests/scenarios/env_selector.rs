//! Scenario: the environment selector always names the environment.
//!
//! Steps:
//! 1. values/prod.yaml tries to set APP_ENV to something else
//! 2. prod is planned and applied
//! 3. a dev-only variable stays out of prod

use crate::common::*;

#[test]
fn scenario_app_env_is_forced_to_env_name() {
    let env = TestEnv::new();
    env.write("secrets/prod.yaml", MOCK_SECRETS);
    env.mock_secret("prod", "db_password", SECRET_VALUE);
    env.write("values/prod.yaml", "APP_ENV: staging\nLOG_LEVEL: warn\n");

    let plan = env.run(&["plan", "prod", "--json"]);
    assert_success(&plan);
    let json = plan.json();
    assert_eq!(json["config"]["added"]["APP_ENV"], "prod");
    assert_eq!(json["config"]["added"]["LOG_LEVEL"], "warn");
    assert!(
        json["config"]["added"].get("DEBUG_TOOLBAR").is_none(),
        "dev-only variable leaked into prod: {}",
        json
    );

    assert_success(&env.run(&["apply", "prod", "--approve"]));
    let record = env.record("mockcloud", "prod");
    assert_eq!(record["config"]["APP_ENV"], "prod");
}

#[test]
fn scenario_scoped_variable_present_in_its_env() {
    let env = TestEnv::new();
    env.mock_secret("dev", "db_password", SECRET_VALUE);

    assert_success(&env.run(&["apply", "dev", "--approve"]));

    let record = env.record("mockcloud", "dev");
    assert_eq!(record["config"]["APP_ENV"], "dev");
    assert_eq!(record["config"]["DEBUG_TOOLBAR"], true);
}
