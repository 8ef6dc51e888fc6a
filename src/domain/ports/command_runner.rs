//! CommandRunner port - abstraction over subprocess execution
//!
//! ssh, bws, curl and hook commands all go through this trait so transports
//! and backends can be exercised without spawning real processes.

use std::io;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// `exit code N` or `terminated by signal`
    pub fn exit_label(&self) -> String {
        match self.status {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external programs
pub trait CommandRunner {
    /// Run `program` with `args`, optionally feeding `stdin`, and wait for it
    fn run(&self, program: &str, args: &[String], stdin: Option<&[u8]>) -> io::Result<CommandOutput>;
}
