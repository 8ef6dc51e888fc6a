//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod hash;
mod lifecycle;
mod posture;
mod provider;
mod secret_value;
mod var_type;

pub use hash::ContentHash;
pub use lifecycle::LifecycleState;
pub use posture::{AuthMode, PreflightMode};
pub use provider::Provider;
pub use secret_value::SecretValue;
pub use var_type::VarType;

/// Marker substituted for secret values wherever a value-shaped placeholder is needed
pub const REDACTED: &str = "<redacted>";
