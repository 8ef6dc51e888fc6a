use anyhow::Result;

use envgate::application::{VerifyOptions, VerifyUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

/// Renders the report first, then fails unless verification is clean
pub fn cmd_verify(
    workspace: &Workspace,
    target: &Target,
    check_remote: bool,
    approve_remote: bool,
    format: OutputFormat,
) -> Result<()> {
    let options = VerifyOptions::new(&target.env)
        .with_workload(target.workload.clone())
        .with_remote_check(check_remote, approve_remote);
    let result = VerifyUseCase::new(workspace).execute(&options)?;
    emit(format, &result, &result.warnings)?;

    match result.failure() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
