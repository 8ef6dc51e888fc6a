//! SSH target resolution
//!
//! Precedence: inline `hosts`, then `hosts_file`, then the single `host`.

use std::path::Path;

use crate::domain::entities::{SshHost, SshTransport};
use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::fs::resolve_against;

/// Every host a delivery goes to, in order
pub fn resolve_targets(root: &Path, ssh: &SshTransport) -> EnvgateResult<Vec<SshHost>> {
    if !ssh.hosts.is_empty() {
        return Ok(ssh.hosts.clone());
    }
    if let Some(file) = &ssh.hosts_file {
        let path = resolve_against(root, &file.to_string_lossy());
        let content = std::fs::read_to_string(&path).map_err(|e| {
            EnvgateError::schema(
                "transport.hosts_file",
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;
        let hosts = parse_hosts_file(&content, &ssh.defaults)?;
        if hosts.is_empty() {
            return Err(EnvgateError::schema(
                "transport.hosts_file",
                format!("{} lists no hosts", path.display()),
            ));
        }
        return Ok(hosts);
    }
    ssh.host.clone().map(|h| vec![h]).ok_or_else(|| {
        EnvgateError::schema("transport", "ssh transports need hosts, hosts_file or host")
    })
}

/// One `[user@]host[:port]` per line; blank lines and `#` comments ignored
pub fn parse_hosts_file(content: &str, defaults: &SshHost) -> EnvgateResult<Vec<SshHost>> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| {
            SshHost::parse(line)
                .map(|h| h.with_defaults(defaults))
                .map_err(|e| EnvgateError::schema(format!("transport.hosts_file:{}", i + 1), e))
        })
        .collect()
}
