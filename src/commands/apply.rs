use anyhow::Result;

use envgate::application::{ApplyOptions, ApplyUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

pub fn cmd_apply(
    workspace: &Workspace,
    target: &Target,
    approve: bool,
    approve_remote: bool,
    format: OutputFormat,
) -> Result<()> {
    let options = ApplyOptions {
        env: target.env.clone(),
        workload: target.workload.clone(),
        approve,
        approve_remote,
    };
    let result = ApplyUseCase::new(workspace).execute(&options)?;
    emit(format, &result, &result.warnings)?;
    Ok(())
}
