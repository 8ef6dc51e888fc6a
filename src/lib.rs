//! envgate - environment configuration reconciler
//!
//! envgate reads a typed contract of environment variables, per-environment
//! values and secret references, and a policy that picks the delivery target.
//! It builds the desired state, diffs it against the last deployed record and
//! delivers it either to a mock cloud record or as an env file (locally or
//! over ssh). Secret values are resolved only at delivery time and never
//! leave the delivered artifact.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::Workspace;
pub use config::Config;
pub use error::{EnvgateError, EnvgateResult};
