//! Isolated project directory for running the envgate binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use super::fixtures::{CONTRACT, MOCK_SECRETS};

/// Result of running an envgate command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({}):\n{}", e, self.stdout))
    }
}

/// A temp project holding the standard contract and `dev` secret references
pub struct TestEnv {
    pub project_root: TempDir,
    bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let env = Self::empty();
        env.write("contract.yaml", CONTRACT);
        env.write("secrets/dev.yaml", MOCK_SECRETS);
        env
    }

    /// Project with no documents at all
    pub fn empty() -> Self {
        Self {
            project_root: TempDir::new().expect("Failed to create temp dir"),
            bin: PathBuf::from(env!("CARGO_BIN_EXE_envgate")),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    pub fn root(&self) -> &Path {
        self.project_root.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
    }

    /// Backing file of a mock secret under the default state directory
    pub fn mock_secret(&self, env: &str, name: &str, value: &str) {
        self.write(
            &format!(".envgate/mockcloud/{}/secrets/{}", env, name),
            &format!("{}\n", value),
        );
    }

    pub fn record_path(&self, provider: &str, env: &str) -> PathBuf {
        self.path(&format!(".envgate/{}/{}/deployed.json", provider, env))
    }

    pub fn record(&self, provider: &str, env: &str) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.record_path(provider, env))
            .expect("deployed record should exist");
        serde_json::from_str(&raw).expect("deployed record should be JSON")
    }

    /// Run envgate with `--root <project>` from inside the project
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = Command::new(&self.bin);
        cmd.current_dir(self.root())
            .arg("--root")
            .arg(self.root())
            .args(args)
            .env_remove("RUST_LOG")
            .env_remove("ENVGATE_STATE_DIR")
            .env_remove("ENVGATE_POLICY");
        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute envgate");
        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Assert success with both streams in the failure message
#[track_caller]
pub fn assert_success(result: &TestResult) {
    assert!(
        result.success,
        "command failed (exit {}).\nstdout:\n{}\nstderr:\n{}",
        result.exit_code, result.stdout, result.stderr
    );
}
