//! StateRepository port - persistence of deployed records
//!
//! One record per `(provider, env)`. Absence is not an error.

use crate::domain::entities::DeployedState;
use crate::domain::value_objects::Provider;
use crate::error::EnvgateResult;

pub trait StateRepository {
    /// Load the record, `None` if nothing was applied yet
    fn load(&self, provider: Provider, env: &str) -> EnvgateResult<Option<DeployedState>>;

    /// Persist the record, replacing any previous one
    fn save(&self, state: &DeployedState) -> EnvgateResult<()>;

    /// Delete the record. Returns whether anything was deleted.
    fn delete(&self, provider: Provider, env: &str) -> EnvgateResult<bool>;
}
