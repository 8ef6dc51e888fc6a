use anyhow::Result;

use envgate::application::{CompileOptions, CompileUseCase, Workspace};
use envgate::presentation::{emit, OutputFormat, Target};

pub fn cmd_compile(
    workspace: &Workspace,
    target: &Target,
    env_file: Option<String>,
    no_write: bool,
    no_context: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut options = CompileOptions::new(&target.env)
        .with_workload(target.workload.clone())
        .with_env_file(env_file);
    if no_write {
        options = options.without_env_file();
    }
    if no_context {
        options = options.without_context();
    }
    let result = CompileUseCase::new(workspace).execute(&options)?;
    emit(format, &result, &result.warnings)?;
    Ok(())
}
