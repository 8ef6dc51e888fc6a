//! Cloud target entity - where and how desired state is delivered
//!
//! Targets are selected by the target rule set of the policy. A rule's `set`
//! block is a partial [`TargetDocument`] layered over the defaults; the merged
//! document is then validated into a [`CloudTarget`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Provider;
use crate::error::{EnvgateError, EnvgateResult};

/// Default env-file name template
pub const DEFAULT_ENV_FILE_TEMPLATE: &str = "{env}.env";

/// Default permission mode for delivered env files
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Partial target definition as written in the policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetDocument {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub env_file: Option<String>,
    #[serde(default)]
    pub transport: Option<TransportDocument>,
    #[serde(default)]
    pub compose: Option<ComposeMetadata>,
    #[serde(default)]
    pub healthcheck: Option<HealthcheckDocument>,
}

impl TargetDocument {
    /// Layer `overrides` on top of `self`, field by field
    pub fn merged_with(&self, overrides: &TargetDocument) -> TargetDocument {
        TargetDocument {
            provider: overrides.provider.clone().or_else(|| self.provider.clone()),
            runtime: overrides.runtime.clone().or_else(|| self.runtime.clone()),
            env_file: overrides.env_file.clone().or_else(|| self.env_file.clone()),
            transport: overrides.transport.clone().or_else(|| self.transport.clone()),
            compose: overrides.compose.clone().or_else(|| self.compose.clone()),
            healthcheck: overrides
                .healthcheck
                .clone()
                .or_else(|| self.healthcheck.clone()),
        }
    }
}

/// Delivery transport as written in the policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportDocument {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    /// Octal permission mode, e.g. `"0600"`
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub sudo: bool,
    #[serde(default)]
    pub pre_commands: Vec<String>,
    #[serde(default)]
    pub post_commands: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<SshHostEntry>,
    #[serde(default)]
    pub hosts_file: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

/// An inline host: either `user@host:port` or a detailed map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SshHostEntry {
    Spec(String),
    Detailed(SshHost),
}

/// Docker-compose metadata carried into the deployed record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Health check as written in the policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthcheckDocument {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A single SSH destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshHost {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl SshHost {
    /// Parse `[user@]host[:port]`
    pub fn parse(spec: &str) -> Result<Self, String> {
        let spec = spec.trim();
        let (user, rest) = match spec.split_once('@') {
            Some((u, r)) if !u.is_empty() => (Some(u.to_string()), r),
            Some(_) => return Err(format!("'{}' has an empty user", spec)),
            None => (None, spec),
        };
        let (host, port) = match rest.rsplit_once(':') {
            Some((h, p)) => {
                let port = p
                    .parse::<u16>()
                    .map_err(|_| format!("'{}' has an invalid port", spec))?;
                (h, Some(port))
            }
            None => (rest, None),
        };
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(format!("'{}' is not a valid ssh host", spec));
        }
        Ok(Self {
            host: host.to_string(),
            user,
            port,
            identity: None,
            options: Vec::new(),
        })
    }

    /// Fill unset fields from transport-level defaults
    pub fn with_defaults(mut self, defaults: &SshHost) -> Self {
        if self.user.is_none() {
            self.user = defaults.user.clone();
        }
        if self.port.is_none() {
            self.port = defaults.port;
        }
        if self.identity.is_none() {
            self.identity = defaults.identity.clone();
        }
        if self.options.is_empty() {
            self.options = defaults.options.clone();
        }
        self
    }

    /// `user@host` or `host`
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Arguments placed before the destination on the ssh command line
    pub fn ssh_args(&self) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.clone());
        }
        for option in &self.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args
    }
}

/// Commands run around a delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pub pre: Vec<String>,
    pub post: Vec<String>,
}

/// Local delivery settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTransport {
    pub dir: PathBuf,
    pub mode: u32,
    pub hooks: Hooks,
}

/// Remote delivery settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTransport {
    pub dir: String,
    pub mode: u32,
    pub sudo: bool,
    pub hooks: Hooks,
    /// Inline hosts, already merged with the transport defaults
    pub hosts: Vec<SshHost>,
    pub hosts_file: Option<PathBuf>,
    pub host: Option<SshHost>,
    /// Transport-level user/port/identity/options
    pub defaults: SshHost,
}

/// Delivery transport of an envfile target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Local(LocalTransport),
    Ssh(SshTransport),
}

impl Transport {
    pub fn kind(&self) -> &'static str {
        match self {
            Transport::Local(_) => "local",
            Transport::Ssh(_) => "ssh",
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Transport::Ssh(_))
    }
}

/// Health check of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Healthcheck {
    pub url: String,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// A validated delivery target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTarget {
    pub provider: Provider,
    pub runtime: String,
    pub env_file_template: String,
    pub transport: Option<Transport>,
    pub compose: Option<ComposeMetadata>,
    pub healthcheck: Option<Healthcheck>,
}

impl Default for CloudTarget {
    fn default() -> Self {
        Self {
            provider: Provider::MockCloud,
            runtime: "local".to_string(),
            env_file_template: DEFAULT_ENV_FILE_TEMPLATE.to_string(),
            transport: None,
            compose: None,
            healthcheck: None,
        }
    }
}

impl CloudTarget {
    /// Validate a (merged) target document. `at` is the field path prefix.
    pub fn from_document(at: &str, doc: &TargetDocument) -> EnvgateResult<Self> {
        let field = |name: &str| format!("{}.{}", at, name);

        let provider: Provider = doc
            .provider
            .as_deref()
            .unwrap_or("mockcloud")
            .parse()
            .map_err(|e: String| EnvgateError::schema(field("provider"), e))?;

        let runtime = doc.runtime.clone().unwrap_or_else(|| "local".to_string());
        if runtime.trim().is_empty() {
            return Err(EnvgateError::schema(field("runtime"), "runtime must not be empty"));
        }

        let env_file_template = doc
            .env_file
            .clone()
            .unwrap_or_else(|| DEFAULT_ENV_FILE_TEMPLATE.to_string());
        if env_file_template.is_empty() || env_file_template.contains('/') {
            return Err(EnvgateError::schema(
                field("env_file"),
                "env_file must be a plain file name template",
            ));
        }

        let transport = match (provider, &doc.transport) {
            (Provider::EnvFile, Some(t)) => Some(parse_transport(&field("transport"), t)?),
            (Provider::EnvFile, None) => {
                return Err(EnvgateError::schema(
                    field("transport"),
                    "envfile targets require a transport",
                ))
            }
            (Provider::MockCloud, Some(_)) => {
                return Err(EnvgateError::schema(
                    field("transport"),
                    "mockcloud targets do not take a transport",
                ))
            }
            (Provider::MockCloud, None) => None,
        };

        let healthcheck = match &doc.healthcheck {
            Some(hc) => {
                let url = hc.url.clone().ok_or_else(|| {
                    EnvgateError::schema(field("healthcheck.url"), "url is required")
                })?;
                url::Url::parse(&url).map_err(|e| {
                    EnvgateError::schema(field("healthcheck.url"), format!("invalid url: {}", e))
                })?;
                if hc.interval_secs == Some(0) {
                    return Err(EnvgateError::schema(
                        field("healthcheck.interval_secs"),
                        "interval must be at least one second",
                    ));
                }
                Some(Healthcheck {
                    url,
                    interval_secs: hc.interval_secs,
                    timeout_secs: hc.timeout_secs,
                })
            }
            None => None,
        };

        Ok(Self {
            provider,
            runtime,
            env_file_template,
            transport,
            compose: doc.compose.clone(),
            healthcheck,
        })
    }

    /// Render the env-file name for an environment
    pub fn env_file_name(&self, env: &str) -> String {
        self.env_file_template
            .replace("{env}", env)
            .replace("{runtime}", &self.runtime)
    }
}

fn parse_transport(at: &str, doc: &TransportDocument) -> EnvgateResult<Transport> {
    let field = |name: &str| format!("{}.{}", at, name);

    let mode = match &doc.mode {
        Some(raw) => u32::from_str_radix(raw.trim_start_matches("0o"), 8)
            .ok()
            .filter(|m| *m <= 0o777)
            .ok_or_else(|| {
                EnvgateError::schema(field("mode"), format!("'{}' is not an octal file mode", raw))
            })?,
        None => DEFAULT_FILE_MODE,
    };

    let dir = doc
        .dir
        .clone()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| EnvgateError::schema(field("dir"), "dir is required"))?;

    let hooks = Hooks {
        pre: doc.pre_commands.clone(),
        post: doc.post_commands.clone(),
    };

    match doc.kind.as_deref().unwrap_or("local") {
        "local" => {
            for (name, set) in [
                ("sudo", doc.sudo),
                ("hosts", !doc.hosts.is_empty()),
                ("hosts_file", doc.hosts_file.is_some()),
                ("host", doc.host.is_some()),
            ] {
                if set {
                    return Err(EnvgateError::schema(
                        field(name),
                        "only valid for ssh transports",
                    ));
                }
            }
            Ok(Transport::Local(LocalTransport {
                dir: PathBuf::from(dir),
                mode,
                hooks,
            }))
        }
        "ssh" => {
            if !dir.starts_with('/') {
                return Err(EnvgateError::schema(
                    field("dir"),
                    "remote dir must be an absolute path",
                ));
            }
            let defaults = SshHost {
                host: String::new(),
                user: doc.user.clone(),
                port: doc.port,
                identity: doc.identity.clone(),
                options: doc.options.clone(),
            };
            let mut hosts = Vec::new();
            for (i, entry) in doc.hosts.iter().enumerate() {
                let host = match entry {
                    SshHostEntry::Spec(spec) => SshHost::parse(spec)
                        .map_err(|e| EnvgateError::schema(format!("{}[{}]", field("hosts"), i), e))?,
                    SshHostEntry::Detailed(host) => host.clone(),
                };
                hosts.push(host.with_defaults(&defaults));
            }
            let host = doc
                .host
                .as_deref()
                .map(SshHost::parse)
                .transpose()
                .map_err(|e| EnvgateError::schema(field("host"), e))?
                .map(|h| h.with_defaults(&defaults));
            if hosts.is_empty() && doc.hosts_file.is_none() && host.is_none() {
                return Err(EnvgateError::schema(
                    at.to_string(),
                    "ssh transports need hosts, hosts_file or host",
                ));
            }
            Ok(Transport::Ssh(SshTransport {
                dir,
                mode,
                sudo: doc.sudo,
                hooks,
                hosts,
                hosts_file: doc.hosts_file.clone().map(PathBuf::from),
                host,
                defaults,
            }))
        }
        other => Err(EnvgateError::schema(
            field("kind"),
            format!("unknown transport '{}' (expected local or ssh)", other),
        )),
    }
}
