//! SSH env-file delivery
//!
//! Hosts are processed in order and the first failure aborts the run;
//! hosts already delivered are left as they are.

use super::envfile::EnvFilePayload;
use crate::domain::entities::{SshHost, SshTransport};
use crate::domain::ports::CommandRunner;
use crate::domain::value_objects::ContentHash;
use crate::error::EnvgateResult;
use crate::infrastructure::fs::RemoteShell;

/// Remote path of the env file
pub fn remote_path(ssh: &SshTransport, file_name: &str) -> String {
    format!("{}/{}", ssh.dir.trim_end_matches('/'), file_name)
}

/// Companion metadata path
pub fn meta_path(path: &str) -> String {
    format!("{}.meta.json", path)
}

/// Deliver to every host: pre-commands, env file, metadata, post-commands
pub fn deliver_ssh(
    runner: &dyn CommandRunner,
    ssh: &SshTransport,
    hosts: &[SshHost],
    file_name: &str,
    payload: &EnvFilePayload,
    metadata: &[u8],
) -> EnvgateResult<()> {
    let path = remote_path(ssh, file_name);
    for host in hosts {
        let shell = RemoteShell::new(runner, host.clone(), ssh.sudo);
        for command in &ssh.hooks.pre {
            shell.run_hook(command)?;
        }
        shell.write_file(&path, payload.content(), ssh.mode)?;
        shell.write_file(&meta_path(&path), metadata, ssh.mode)?;
        for command in &ssh.hooks.post {
            shell.run_hook(command)?;
        }
        tracing::info!(host = %shell.destination(), path = %path, bytes = payload.bytes, "delivered env file");
    }
    Ok(())
}

/// Remote hash of `path` on each host, `None` where the file is missing
pub fn remote_hashes(
    runner: &dyn CommandRunner,
    ssh: &SshTransport,
    hosts: &[SshHost],
    path: &str,
) -> EnvgateResult<Vec<(String, Option<ContentHash>)>> {
    hosts
        .iter()
        .map(|host| {
            let shell = RemoteShell::new(runner, host.clone(), ssh.sudo);
            Ok((shell.destination(), shell.sha256(path)?))
        })
        .collect()
}
