//! envgate CLI - environment configuration reconciler
//!
//! Usage: envgate <COMMAND> <ENV>
//!
//! Commands:
//!   plan          Show what apply would change
//!   drift         Same as plan
//!   apply         Deliver the desired state and record it
//!   verify        Check deployed state and delivered files
//!   compile       Write a local env file and masked context
//!   rotate        Rotate a mock secret
//!   decommission  Delete the deployed record of an environment
//!   doctor        Check that every secret reference resolves

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use envgate::presentation::{Cli, Commands, OutputFormat};
use envgate::{Config, Workspace};

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// `-v` enables debug, `-vv` trace; `RUST_LOG` wins when set
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "envgate=debug",
        _ => "envgate=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let (config, warnings) = Config::discover(&cli.root, cli.config.as_deref())?;
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    let workspace = Workspace::new(cli.root.clone(), config);
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Plan { target } | Commands::Drift { target } => {
            commands::cmd_plan(&workspace, target, format)
        }
        Commands::Apply {
            target,
            approve,
            approve_remote,
        } => commands::cmd_apply(&workspace, target, *approve, *approve_remote, format),
        Commands::Verify {
            target,
            check_remote,
            approve_remote,
        } => commands::cmd_verify(&workspace, target, *check_remote, *approve_remote, format),
        Commands::Rotate {
            target,
            secret,
            approve,
        } => commands::cmd_rotate(&workspace, target, secret, *approve, format),
        Commands::Decommission { target, approve } => {
            commands::cmd_decommission(&workspace, target, *approve, format)
        }
        Commands::Compile {
            target,
            env_file,
            no_write,
            no_context,
        } => commands::cmd_compile(
            &workspace,
            target,
            env_file.clone(),
            *no_write,
            *no_context,
            format,
        ),
        Commands::Doctor { target } => commands::cmd_doctor(&workspace, target, format),
    }
}
