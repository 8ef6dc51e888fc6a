use anyhow::Result;

use envgate::application::{PlanOptions, PlanUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

/// `plan` and `drift`
pub fn cmd_plan(workspace: &Workspace, target: &Target, format: OutputFormat) -> Result<()> {
    let options = PlanOptions::new(&target.env).with_workload(target.workload.clone());
    let result = PlanUseCase::new(workspace).execute(&options)?;
    tracing::debug!(status = %result.diff.status, "plan computed");
    emit(format, &result, &result.warnings)?;
    Ok(())
}
