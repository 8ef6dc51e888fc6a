//! Apply Module
//!
//! Delivers the desired state of an environment and records it.
//!
//! ## Structure
//!
//! - `options` - Approval flags and selection (`ApplyOptions`)
//! - `result` - What was delivered (`ApplyResult`)
//! - `use_case` - Orchestration (`ApplyUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use envgate::application::apply::{ApplyOptions, ApplyUseCase};
//!
//! let result = ApplyUseCase::new(&workspace).execute(&ApplyOptions::new("dev").approved())?;
//! ```

mod options;
mod result;
mod use_case;

pub use options::ApplyOptions;
pub use result::ApplyResult;
pub use use_case::ApplyUseCase;
