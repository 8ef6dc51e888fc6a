//! Apply Options

/// Options for the apply use case
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub env: String,
    pub workload: Option<String>,
    /// `--approve`: required for any apply
    pub approve: bool,
    /// `--approve-remote`: additionally required for ssh delivery
    pub approve_remote: bool,
}

impl ApplyOptions {
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            ..Self::default()
        }
    }

    pub fn with_workload(mut self, workload: Option<String>) -> Self {
        self.workload = workload;
        self
    }

    pub fn approved(mut self) -> Self {
        self.approve = true;
        self
    }

    pub fn remote_approved(mut self) -> Self {
        self.approve_remote = true;
        self
    }
}
