//! Repository Implementations
//!
//! Concrete implementations of the StateRepository port.

mod deployed_state;

pub use deployed_state::{EnvLock, JsonStateRepository};
