//! Configuration module for envgate
//!
//! Resolution order:
//! 1. `--config <file>` (or `<root>/envgate.toml`)
//! 2. Environment variables (`ENVGATE_STATE_DIR`, `ENVGATE_POLICY`)
//! 3. Built-in defaults
//!
//! Unknown keys never fail a load; they are returned as warnings.

mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use loader::{with_env_overrides, ConfigWarning, CONFIG_FILE};
pub use types::{Config, ContractConfig, HealthcheckConfig, PathsConfig};
