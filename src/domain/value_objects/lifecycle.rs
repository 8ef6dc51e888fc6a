//! Lifecycle state of a contract variable

use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a contract variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Active,
    Deprecated,
    Removed,
}

impl LifecycleState {
    pub fn is_removed(&self) -> bool {
        matches!(self, LifecycleState::Removed)
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, LifecycleState::Deprecated)
    }
}

impl FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LifecycleState::Active),
            "deprecated" => Ok(LifecycleState::Deprecated),
            "removed" => Ok(LifecycleState::Removed),
            other => Err(format!(
                "unknown state '{}' (expected active, deprecated or removed)",
                other
            )),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Active => "active",
            LifecycleState::Deprecated => "deprecated",
            LifecycleState::Removed => "removed",
        })
    }
}
