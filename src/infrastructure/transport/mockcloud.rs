//! Mock cloud provider
//!
//! The deployed record itself is the provider state. Rotation replaces the
//! mock backing file of a secret with a fresh random value.

use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::value_objects::SecretValue;
use crate::error::EnvgateResult;
use crate::infrastructure::fs::LocalFs;
use crate::infrastructure::secrets::mock_secret_path;

/// Length of generated secret values
pub const ROTATED_SECRET_LEN: usize = 48;

pub fn generate_secret() -> SecretValue {
    let value: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ROTATED_SECRET_LEN)
        .map(char::from)
        .collect();
    SecretValue::new(value)
}

/// Overwrite the mock backing file of `name` with a new random value
pub fn rotate_mock_secret(state_dir: &Path, env: &str, name: &str) -> EnvgateResult<()> {
    let path = mock_secret_path(state_dir, env, name);
    let value = generate_secret();
    let content = format!("{}\n", value.expose());
    LocalFs::new().write_atomic(&path, content.as_bytes(), 0o600)?;
    tracing::info!(secret = name, env, "rotated mock secret");
    Ok(())
}
