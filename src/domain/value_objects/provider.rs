//! Provider value object - where desired state is materialized
//!
//! - `MockCloud`: an in-process JSON record standing in for a cloud API
//! - `EnvFile`: an env file delivered locally or over ssh

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Delivery provider of a cloud target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    MockCloud,
    EnvFile,
}

impl Provider {
    /// Directory name used under the state directory
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::MockCloud => "mockcloud",
            Provider::EnvFile => "envfile",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    /// Parse a provider name, normalizing legacy aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mockcloud" | "mock" | "mock-cloud" | "mock_cloud" => Ok(Provider::MockCloud),
            "envfile" | "env-file" | "env_file" | "dotenv" => Ok(Provider::EnvFile),
            other => Err(format!(
                "unknown provider '{}' (expected mockcloud or envfile)",
                other
            )),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
