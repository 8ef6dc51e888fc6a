//! Tests for the config module

use super::loader::{discover, load_with_warnings, suggest_key, with_overrides_from};
use super::types::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.paths.contract, PathBuf::from("contract.yaml"));
    assert_eq!(config.paths.state_dir, PathBuf::from(".envgate"));
    assert_eq!(config.contract.env_selector, "APP_ENV");
    assert_eq!(config.healthcheck.interval_secs, 2);
    assert_eq!(config.healthcheck.timeout_secs, 30);
}

#[test]
fn test_config_parse_toml() {
    let toml = r#"
[paths]
contract = "config/contract.yaml"
state_dir = "/var/lib/envgate"

[contract]
env_selector = "DEPLOY_ENV"

[healthcheck]
timeout_secs = 10
"#;

    let config: Config = toml::from_str(toml).unwrap();

    assert_eq!(config.paths.contract, PathBuf::from("config/contract.yaml"));
    assert_eq!(config.paths.values_dir, PathBuf::from("values"));
    assert_eq!(config.contract.env_selector, "DEPLOY_ENV");
    assert_eq!(config.healthcheck.interval_secs, 2);
    assert_eq!(config.healthcheck.timeout_secs, 10);
    assert_eq!(
        config.state_dir(Path::new("/srv/app")),
        PathBuf::from("/var/lib/envgate")
    );
}

#[test]
fn test_document_paths_per_environment() {
    let config = Config::default();
    let root = Path::new("/srv/app");

    assert_eq!(
        config.values_path(root, "prod"),
        PathBuf::from("/srv/app/values/prod.yaml")
    );
    assert_eq!(
        config.secrets_path(root, "prod"),
        PathBuf::from("/srv/app/secrets/prod.yaml")
    );
}

#[test]
fn test_unknown_keys_become_warnings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("envgate.toml");
    fs::write(&path, "[paths]\nstate_dri = \"x\"\n\n[extra]\nfoo = 1\n").unwrap();

    let (config, warnings) = load_with_warnings(&path).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].key, "state_dri");
    assert_eq!(warnings[0].line, Some(2));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("state_dir"));
    assert!(warnings[0].to_string().contains("did you mean 'state_dir'"));
}

#[test]
fn test_malformed_toml_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("envgate.toml");
    fs::write(&path, "[paths\n").unwrap();

    assert!(load_with_warnings(&path).is_err());
}

#[test]
fn test_discover_missing_default_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let (config, warnings) = discover(dir.path(), None).unwrap();
    assert_eq!(config.paths.contract, PathBuf::from("contract.yaml"));
    assert!(warnings.is_empty());
}

#[test]
fn test_discover_missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = discover(dir.path(), Some(Path::new("nope.toml"))).unwrap_err();
    assert!(err.to_string().contains("config file not found"));
}

#[test]
fn test_env_overrides() {
    let config = with_overrides_from(Config::default(), |key| match key {
        "ENVGATE_STATE_DIR" => Some("/tmp/state".to_string()),
        "ENVGATE_POLICY" => Some("  ".to_string()),
        _ => None,
    });

    assert_eq!(config.paths.state_dir, PathBuf::from("/tmp/state"));
    assert_eq!(config.paths.policy, PathBuf::from("policy.yaml"));
}

#[test]
fn test_suggest_key() {
    assert_eq!(suggest_key("polcy").as_deref(), Some("policy"));
    assert_eq!(suggest_key("completely_different"), None);
}
