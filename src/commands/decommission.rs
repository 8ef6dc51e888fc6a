use anyhow::Result;

use envgate::application::{DecommissionOptions, DecommissionUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

pub fn cmd_decommission(
    workspace: &Workspace,
    target: &Target,
    approve: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut options =
        DecommissionOptions::new(&target.env).with_workload(target.workload.clone());
    options.approve = approve;
    let result = DecommissionUseCase::new(workspace).execute(&options)?;
    emit(format, &result, &[])?;
    Ok(())
}
