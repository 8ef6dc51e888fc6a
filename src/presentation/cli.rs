//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--root, --config, --json, --verbose) are inherited by all subcommands
//! - Mutating commands do nothing without their approval flags

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// envgate - environment configuration reconciler
#[derive(Parser, Debug)]
#[command(name = "envgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root holding contract, values, secrets and policy
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Config file (defaults to <root>/envgate.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Environment selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Environment name
    pub env: String,

    /// Workload used for rule matching
    #[arg(long)]
    pub workload: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what apply would change
    Plan {
        #[command(flatten)]
        target: Target,
    },

    /// Report drift between desired and deployed state (same as plan)
    Drift {
        #[command(flatten)]
        target: Target,
    },

    /// Deliver the desired state and record it
    Apply {
        #[command(flatten)]
        target: Target,

        /// Confirm the apply
        #[arg(long)]
        approve: bool,

        /// Confirm delivery to remote hosts over ssh
        #[arg(long)]
        approve_remote: bool,
    },

    /// Check deployed state and delivered files (exits 1 unless clean)
    Verify {
        #[command(flatten)]
        target: Target,

        /// Re-hash env files on remote hosts
        #[arg(long, requires = "approve_remote")]
        check_remote: bool,

        /// Confirm connecting to remote hosts
        #[arg(long)]
        approve_remote: bool,
    },

    /// Rotate a mock secret (mockcloud only)
    Rotate {
        #[command(flatten)]
        target: Target,

        /// Secret name
        secret: String,

        /// Confirm the rotation
        #[arg(long)]
        approve: bool,
    },

    /// Delete the deployed record of an environment (mockcloud only)
    Decommission {
        #[command(flatten)]
        target: Target,

        /// Confirm the deletion
        #[arg(long)]
        approve: bool,
    },

    /// Write a local env file (mode 0600) and a masked effective context
    Compile {
        #[command(flatten)]
        target: Target,

        /// Env-file path (absolute or relative to the root)
        #[arg(long)]
        env_file: Option<String>,

        /// Do not write the env file
        #[arg(long)]
        no_write: bool,

        /// Do not write docs/context/env/effective-<env>.json
        #[arg(long)]
        no_context: bool,
    },

    /// Check that every secret reference resolves
    Doctor {
        #[command(flatten)]
        target: Target,
    },
}
