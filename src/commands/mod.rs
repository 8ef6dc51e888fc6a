//! Command handlers
//!
//! Each handler maps CLI arguments to use case options, runs the use case
//! and renders the result.

mod apply;
mod compile;
mod decommission;
mod doctor;
mod plan;
mod rotate;
mod verify;

pub use apply::cmd_apply;
pub use compile::cmd_compile;
pub use decommission::cmd_decommission;
pub use doctor::cmd_doctor;
pub use plan::cmd_plan;
pub use rotate::cmd_rotate;
pub use verify::cmd_verify;
