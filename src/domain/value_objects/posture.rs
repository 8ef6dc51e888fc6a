//! Authentication posture value objects
//!
//! `AuthMode` says which credential shapes a runtime may rely on;
//! `PreflightMode` says how strictly preflight violations are treated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Credential posture of a runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthMode {
    /// Only role/session credentials are acceptable
    #[serde(rename = "role-only")]
    RoleOnly,
    /// Role preferred, access-key fallback tolerated with a warning
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Long-lived access keys are expected
    #[serde(rename = "ak-only")]
    AkOnly,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role-only" => Ok(AuthMode::RoleOnly),
            "auto" => Ok(AuthMode::Auto),
            "ak-only" => Ok(AuthMode::AkOnly),
            other => Err(format!(
                "unknown auth_mode '{}' (expected role-only, auto or ak-only)",
                other
            )),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthMode::RoleOnly => "role-only",
            AuthMode::Auto => "auto",
            AuthMode::AkOnly => "ak-only",
        })
    }
}

/// Strictness of the preflight credential scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreflightMode {
    Fail,
    #[default]
    Warn,
    Off,
}

impl FromStr for PreflightMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(PreflightMode::Fail),
            "warn" => Ok(PreflightMode::Warn),
            "off" => Ok(PreflightMode::Off),
            other => Err(format!(
                "unknown preflight_mode '{}' (expected fail, warn or off)",
                other
            )),
        }
    }
}

impl fmt::Display for PreflightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PreflightMode::Fail => "fail",
            PreflightMode::Warn => "warn",
            PreflightMode::Off => "off",
        })
    }
}
