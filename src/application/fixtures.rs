//! Test project builder shared by the use-case tests

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use crate::config::Config;
use crate::domain::ports::{CommandOutput, CommandRunner};
use crate::infrastructure::secrets::mock_secret_path;

use super::workspace::Workspace;

pub const CONTRACT: &str = r#"
variables:
  APP_ENV:
    type: string
    required: true
  LOG_LEVEL:
    type: enum
    values: [debug, info, warn]
    default: info
  PORT:
    type: int
    default: 8080
  DB_PASSWORD:
    type: string
    required: true
    secret: true
    secret_ref: db_password
"#;

pub const MOCK_SECRETS: &str = "db_password:\n  backend: mock\n";

pub const ENVFILE_POLICY: &str = r#"
version: 1
targets:
  defaults:
    provider: envfile
    runtime: compose
    transport:
      kind: local
      dir: deploy
"#;

pub const SSH_POLICY: &str = r#"
version: 1
targets:
  defaults:
    provider: envfile
    runtime: vm
    transport:
      kind: ssh
      dir: /etc/app
      sudo: true
      hosts: ["deploy@web1", "deploy@web2:2222"]
"#;

/// Records every command and answers from a table keyed by program name
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    pub calls: Rc<RefCell<Vec<(String, Vec<String>, Option<Vec<u8>>)>>>,
    pub replies: Rc<RefCell<BTreeMap<String, CommandOutput>>>,
}

impl ScriptedRunner {
    pub fn reply(&self, program: &str, status: i32, stdout: &str) {
        self.replies.borrow_mut().insert(
            program.to_string(),
            CommandOutput {
                status: Some(status),
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        );
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(p, _, _)| p.clone()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String], stdin: Option<&[u8]>) -> io::Result<CommandOutput> {
        self.calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec(), stdin.map(<[u8]>::to_vec)));
        Ok(self
            .replies
            .borrow()
            .get(program)
            .cloned()
            .unwrap_or(CommandOutput {
                status: Some(0),
                ..CommandOutput::default()
            }))
    }
}

/// A project directory with the standard documents of one environment
pub struct Project {
    pub dir: TempDir,
    pub runner: ScriptedRunner,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
            runner: ScriptedRunner::default(),
        };
        project.write("contract.yaml", CONTRACT);
        project.write("secrets/dev.yaml", MOCK_SECRETS);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join(".envgate")
    }

    pub fn mock_secret(&self, env: &str, name: &str, value: &str) {
        let path = mock_secret_path(&self.state_dir(), env, name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("{}\n", value)).unwrap();
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.root(), Config::default())
            .with_runner(Box::new(self.runner.clone()))
            .with_process_env(BTreeMap::new())
    }
}
