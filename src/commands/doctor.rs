use anyhow::Result;

use envgate::application::{DoctorOptions, DoctorUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

/// Advisory: unresolvable secrets are reported, not treated as failure
pub fn cmd_doctor(workspace: &Workspace, target: &Target, format: OutputFormat) -> Result<()> {
    let options = DoctorOptions::new(&target.env).with_workload(target.workload.clone());
    let result = DoctorUseCase::new(workspace).execute(&options)?;
    if !result.is_healthy() {
        tracing::warn!(problems = result.problems(), "unresolvable secrets");
    }
    emit(format, &result, &result.warnings)?;
    Ok(())
}
