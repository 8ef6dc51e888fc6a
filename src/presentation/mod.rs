//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - Command line definition
//! - `output` - Text and JSON rendering of use case results

pub mod cli;
pub mod output;

pub use cli::{Cli, Commands, Target};
pub use output::{emit, render, OutputFormat, TextReport};
