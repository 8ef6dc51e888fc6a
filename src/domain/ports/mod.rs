//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod command_runner;
pub mod secret_backend;
pub mod state_repository;

pub use command_runner::{CommandOutput, CommandRunner};
pub use secret_backend::{SecretBackend, SecretRequest};
pub use state_repository::StateRepository;
