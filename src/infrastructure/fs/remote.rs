//! Remote shell over SSH
//!
//! Every remote step is one `ssh <args> <destination> <script>` invocation
//! through the CommandRunner port. Content is streamed on stdin, never put on
//! a command line. Stderr of sensitive steps (writes, hooks) is withheld from
//! errors since it may echo delivered content.

use crate::domain::entities::SshHost;
use crate::domain::ports::CommandRunner;
use crate::domain::value_objects::ContentHash;
use crate::error::{EnvgateError, EnvgateResult};

/// Quote a string for safe use in a POSIX shell command
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Parent directory of a remote absolute path
fn remote_parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => ".",
    }
}

/// A shell on one remote host
pub struct RemoteShell<'r> {
    runner: &'r dyn CommandRunner,
    host: SshHost,
    sudo: bool,
}

impl<'r> RemoteShell<'r> {
    pub fn new(runner: &'r dyn CommandRunner, host: SshHost, sudo: bool) -> Self {
        Self { runner, host, sudo }
    }

    /// `user@host`, used in errors and records
    pub fn destination(&self) -> String {
        self.host.destination()
    }

    fn sudo_prefix(&self) -> &'static str {
        if self.sudo {
            "sudo -n "
        } else {
            ""
        }
    }

    /// Run `script` remotely and return its stdout.
    ///
    /// `sensitive` steps report only the exit status on failure.
    pub fn exec(
        &self,
        operation: &str,
        script: &str,
        stdin: Option<&[u8]>,
        sensitive: bool,
    ) -> EnvgateResult<String> {
        let mut args = self.host.ssh_args();
        args.push(self.destination());
        args.push(script.to_string());

        let output = self
            .runner
            .run("ssh", &args, stdin)
            .map_err(|e| self.failure(operation, format!("could not run ssh: {}", e)))?;

        if !output.success() {
            let mut message = output.exit_label();
            let stderr = output.stderr_str();
            if !sensitive && !stderr.is_empty() {
                message = format!("{}: {}", message, stderr);
            }
            return Err(self.failure(operation, message));
        }
        Ok(output.stdout_str())
    }

    fn failure(&self, operation: &str, message: String) -> EnvgateError {
        EnvgateError::Transport {
            operation: operation.to_string(),
            host: self.destination(),
            message,
        }
    }

    /// Run a pre/post hook command
    pub fn run_hook(&self, command: &str) -> EnvgateResult<()> {
        tracing::debug!(host = %self.destination(), "running hook");
        self.exec(&format!("hook '{}'", command), command, None, true)
            .map(|_| ())
    }

    /// Write `content` to `path` via a temp file and rename.
    ///
    /// With sudo the content is first staged in a user-owned temp file, then
    /// copied to a root-owned temp file beside the destination and renamed.
    /// Both temp files are removed if any step fails.
    pub fn write_file(&self, path: &str, content: &[u8], mode: u32) -> EnvgateResult<()> {
        let script = self.write_script(path, mode);
        self.exec(&format!("write {}", path), &script, Some(content), true)
            .map(|_| ())
    }

    fn write_script(&self, path: &str, mode: u32) -> String {
        let dest = quote(path);
        let dir = quote(remote_parent(path));
        let template = quote(&format!("{}/.envgate.XXXXXX", remote_parent(path)));
        let mode = format!("{:04o}", mode);

        if self.sudo {
            format!(
                "set -e; umask 077; tmp=; stage=$(mktemp); \
                 trap 'rm -f \"$stage\"; if [ -n \"$tmp\" ]; then sudo -n rm -f \"$tmp\"; fi' EXIT; \
                 cat > \"$stage\"; \
                 sudo -n mkdir -p {dir}; \
                 tmp=$(sudo -n mktemp {template}); \
                 sudo -n cp \"$stage\" \"$tmp\"; \
                 sudo -n chmod {mode} \"$tmp\"; \
                 sudo -n mv -f \"$tmp\" {dest}; \
                 tmp="
            )
        } else {
            format!(
                "set -e; umask 077; mkdir -p {dir}; \
                 tmp=$(mktemp {template}); trap 'rm -f \"$tmp\"' EXIT; \
                 cat > \"$tmp\"; \
                 chmod {mode} \"$tmp\"; \
                 mv -f \"$tmp\" {dest}"
            )
        }
    }

    /// SHA-256 of a remote file, `None` if it does not exist.
    ///
    /// Uses the first available of `sha256sum`, `shasum -a 256` and
    /// `openssl dgst -sha256`.
    pub fn sha256(&self, path: &str) -> EnvgateResult<Option<ContentHash>> {
        let out = self.exec(&format!("hash {}", path), &self.hash_script(path), None, false)?;
        let out = out.trim();
        if out == "missing" {
            return Ok(None);
        }
        let hex = out.split_whitespace().next().unwrap_or("");
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.failure(
                &format!("hash {}", path),
                "unexpected checksum output".to_string(),
            ));
        }
        Ok(Some(ContentHash::new(hex)))
    }

    fn hash_script(&self, path: &str) -> String {
        let p = quote(path);
        let s = self.sudo_prefix();
        format!(
            "if ! {s}test -e {p}; then echo missing; exit 0; fi; \
             if command -v sha256sum >/dev/null 2>&1; then {s}sha256sum {p}; \
             elif command -v shasum >/dev/null 2>&1; then {s}shasum -a 256 {p}; \
             elif command -v openssl >/dev/null 2>&1; then {s}openssl dgst -sha256 -r {p}; \
             else echo 'no sha256 tool available' >&2; exit 127; fi"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CommandOutput;
    use std::cell::RefCell;
    use std::io;

    /// Records invocations and replays canned outputs
    struct Recorder {
        calls: RefCell<Vec<(Vec<String>, Option<Vec<u8>>)>>,
        reply: CommandOutput,
    }

    impl Recorder {
        fn replying(status: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply: CommandOutput {
                    status: Some(status),
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                },
            }
        }
    }

    impl CommandRunner for Recorder {
        fn run(&self, program: &str, args: &[String], stdin: Option<&[u8]>) -> io::Result<CommandOutput> {
            assert_eq!(program, "ssh");
            self.calls
                .borrow_mut()
                .push((args.to_vec(), stdin.map(<[u8]>::to_vec)));
            Ok(self.reply.clone())
        }
    }

    fn host() -> SshHost {
        SshHost::parse("deploy@web1:2222").unwrap()
    }

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote("/etc/app/dev.env"), "'/etc/app/dev.env'");
        assert_eq!(quote("/srv/it's.env"), "'/srv/it'\\''s.env'");
    }

    #[test]
    fn remote_parent_of_paths() {
        assert_eq!(remote_parent("/etc/app/dev.env"), "/etc/app");
        assert_eq!(remote_parent("/dev.env"), "/");
    }

    #[test]
    fn write_streams_content_on_stdin() {
        let runner = Recorder::replying(0, "", "");
        let shell = RemoteShell::new(&runner, host(), false);

        shell.write_file("/etc/app/dev.env", b"SECRET=\"x\"\n", 0o600).unwrap();

        let calls = runner.calls.borrow();
        let (args, stdin) = &calls[0];
        assert_eq!(&args[..4], &["-o", "BatchMode=yes", "-p", "2222"]);
        assert_eq!(args[4], "deploy@web1");
        assert!(args[5].contains("chmod 0600"));
        assert!(!args[5].contains("SECRET"));
        assert_eq!(stdin.as_deref(), Some(&b"SECRET=\"x\"\n"[..]));
    }

    #[test]
    fn sudo_write_stages_through_a_second_temp_file() {
        let runner = Recorder::replying(0, "", "");
        let shell = RemoteShell::new(&runner, host(), true);

        shell.write_file("/etc/app/dev.env", b"x", 0o640).unwrap();

        let script = &runner.calls.borrow()[0].0[5];
        assert!(script.contains("stage=$(mktemp)"));
        assert!(script.contains("sudo -n mktemp '/etc/app/.envgate.XXXXXX'"));
        assert!(script.contains("sudo -n mv -f \"$tmp\" '/etc/app/dev.env'"));
    }

    #[test]
    fn sudo_write_cleans_up_both_temp_files() {
        let runner = Recorder::replying(0, "", "");
        let shell = RemoteShell::new(&runner, host(), true);

        shell.write_file("/etc/app/dev.env", b"x", 0o600).unwrap();

        let script = &runner.calls.borrow()[0].0[5];
        let trap_at = script.find("trap '").unwrap();
        assert!(script.starts_with("set -e; umask 077; tmp=;"));
        assert!(script.find("tmp=$(sudo -n mktemp").unwrap() > trap_at);
        let trap = &script[trap_at..script.find("' EXIT").unwrap()];
        assert!(trap.contains("rm -f \"$stage\""));
        assert!(trap.contains("sudo -n rm -f \"$tmp\""));
        assert!(script.ends_with("'/etc/app/dev.env'; tmp="));
    }

    #[test]
    fn failed_write_hides_stderr() {
        let runner = Recorder::replying(1, "", "cat: A=\"leaked\"");
        let shell = RemoteShell::new(&runner, host(), false);

        let err = shell.write_file("/etc/app/dev.env", b"x", 0o600).unwrap_err();

        let text = err.to_string();
        assert!(text.contains("exit code 1"));
        assert!(text.contains("deploy@web1"));
        assert!(!text.contains("leaked"));
    }

    #[test]
    fn failed_hash_surfaces_stderr() {
        let runner = Recorder::replying(127, "", "no sha256 tool available");
        let shell = RemoteShell::new(&runner, host(), false);

        let err = shell.sha256("/etc/app/dev.env").unwrap_err();
        assert!(err.to_string().contains("no sha256 tool available"));
    }

    #[test]
    fn sha256_parses_first_token() {
        let hex = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        let runner = Recorder::replying(0, &format!("{}  /etc/app/dev.env\n", hex), "");
        let shell = RemoteShell::new(&runner, host(), false);

        assert_eq!(
            shell.sha256("/etc/app/dev.env").unwrap(),
            Some(ContentHash::new(hex))
        );
    }

    #[test]
    fn sha256_of_missing_file_is_none() {
        let runner = Recorder::replying(0, "missing\n", "");
        let shell = RemoteShell::new(&runner, host(), true);

        assert_eq!(shell.sha256("/etc/app/dev.env").unwrap(), None);
        let script = &runner.calls.borrow()[0].0[5];
        assert!(script.contains("sudo -n test -e"));
        assert!(script.contains("openssl dgst -sha256"));
    }
}
