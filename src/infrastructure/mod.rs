//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `documents` - Strict YAML loading of contract, values, secrets and policy
//! - `fs/` - Local atomic writes and the remote ssh shell
//! - `process` - Subprocess runner
//! - `repositories/` - Deployed-state persistence and locking
//! - `secrets/` - Secret backends and the resolver
//! - `transport/` - Env-file rendering and delivery, health checks, rotation

pub mod documents;
pub mod fs;
pub mod process;
pub mod repositories;
pub mod secrets;
pub mod transport;

// Re-export for convenience
pub use documents::{parse_document, read_document};
pub use fs::{LocalFs, RemoteShell};
pub use process::SystemCommandRunner;
pub use repositories::{EnvLock, JsonStateRepository};
pub use secrets::{ResolverContext, SecretResolver, SecretStatus};
