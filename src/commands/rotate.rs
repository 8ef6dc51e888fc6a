use anyhow::Result;

use envgate::application::{RotateOptions, RotateUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

pub fn cmd_rotate(
    workspace: &Workspace,
    target: &Target,
    secret: &str,
    approve: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut options = RotateOptions::new(&target.env, secret).with_workload(target.workload.clone());
    options.approve = approve;
    let result = RotateUseCase::new(workspace).execute(&options)?;
    emit(format, &result, &[])?;
    Ok(())
}
