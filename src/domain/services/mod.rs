//! Domain Services
//!
//! Pure business logic services that operate on domain entities.
//! These services have no I/O dependencies and are easily testable.

mod desired_builder;
mod differ;

pub use desired_builder::{build_desired_state, BuildInputs, DEFAULT_ENV_SELECTOR};
pub use differ::{diff_state, Change, MapDiff, PlanStatus, StateDiff};
