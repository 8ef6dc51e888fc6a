//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `PlanUseCase` - Diff desired against deployed (also `drift`)
//! - `ApplyUseCase` - Deliver and record, behind approval gates
//! - `CompileUseCase` - Write a local env file and masked context
//! - `VerifyUseCase` - Diff plus hash re-check of delivered files
//! - `RotateUseCase` - Rotate a mock secret and bump its version
//! - `DecommissionUseCase` - Delete a mockcloud record
//! - `DoctorUseCase` - Report secret resolvability

pub mod apply;
pub mod compile;
mod context;
pub mod decommission;
pub mod doctor;
mod evidence;
pub mod plan;
pub mod rotate;
pub mod verify;
pub mod workspace;

#[cfg(test)]
mod fixtures;

pub use apply::{ApplyOptions, ApplyResult, ApplyUseCase};
pub use compile::{CompileOptions, CompileResult, CompileUseCase, CompiledKey};
pub use decommission::{DecommissionOptions, DecommissionResult, DecommissionUseCase};
pub use doctor::{DoctorOptions, DoctorResult, DoctorUseCase};
pub use plan::{PlanOptions, PlanResult, PlanUseCase};
pub use rotate::{RotateOptions, RotateResult, RotateUseCase};
pub use verify::{HashCheck, VerifyOptions, VerifyResult, VerifyUseCase};
pub use workspace::{validate_env_name, EnvContext, Workspace};
