//! `bws` backend - Bitwarden Secrets Manager through its CLI
//!
//! Identity lookups are cached for the lifetime of the backend (one
//! invocation): project name -> id from `project list`, and key -> secret id
//! per project from `secret list <project-id>`. Values are fetched with
//! `secret get <id>` and never cached.
//!
//! CLI failures report the exit code and the command prefix only; stdout and
//! stderr may contain secret material and are discarded.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::entities::{BackendKind, SecretBackendConfig};
use crate::domain::policies::BwsSettings;
use crate::domain::ports::{CommandRunner, SecretBackend, SecretRequest};
use crate::domain::value_objects::SecretValue;
use crate::error::{EnvgateError, EnvgateResult};

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SecretEntry {
    id: String,
    key: String,
}

#[derive(Deserialize)]
struct SecretPayload {
    value: String,
}

#[derive(Debug, Default)]
struct IdentityCache {
    /// `None` until `project list` ran
    projects: Option<ProjectIndex>,
    /// project id -> key -> secret id
    secret_ids: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Default)]
struct ProjectIndex {
    by_name: BTreeMap<String, String>,
    ids: BTreeSet<String>,
}

pub struct BwsBackend<'r> {
    runner: &'r dyn CommandRunner,
    settings: BwsSettings,
    token_present: bool,
    cache: IdentityCache,
}

impl<'r> BwsBackend<'r> {
    pub fn new(runner: &'r dyn CommandRunner, settings: BwsSettings, token_present: bool) -> Self {
        Self {
            runner,
            settings,
            token_present,
            cache: IdentityCache::default(),
        }
    }

    /// Run `bws <args> --output json --color no` and parse stdout
    fn run_json<T: DeserializeOwned>(&self, secret: &str, args: &[&str]) -> EnvgateResult<T> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.extend(["--output", "json", "--color", "no"].map(String::from));

        let prefix = format!(
            "{} {}",
            self.settings.command,
            args.iter().take(2).copied().collect::<Vec<_>>().join(" ")
        );
        tracing::debug!(command = %prefix, "calling bws");

        let output = self
            .runner
            .run(&self.settings.command, &full, None)
            .map_err(|e| {
                let message = if e.kind() == io::ErrorKind::NotFound {
                    format!(
                        "{} CLI not found in PATH (install the Bitwarden Secrets Manager CLI)",
                        self.settings.command
                    )
                } else {
                    format!("{} failed to start: {}", prefix, e)
                };
                EnvgateError::secret(secret, message)
            })?;

        if !output.success() {
            return Err(EnvgateError::secret(
                secret,
                format!("bws command failed ({}): {} ...", output.exit_label(), prefix),
            ));
        }

        serde_json::from_slice(&output.stdout).map_err(|_| {
            EnvgateError::secret(secret, format!("{} returned unexpected JSON", prefix))
        })
    }

    fn project_id(&mut self, secret: &str, project: &str) -> EnvgateResult<String> {
        if self.cache.projects.is_none() {
            let listed: Vec<ProjectEntry> = self.run_json(secret, &["project", "list"])?;
            let mut index = ProjectIndex::default();
            for entry in listed {
                index.ids.insert(entry.id.clone());
                index.by_name.insert(entry.name, entry.id);
            }
            self.cache.projects = Some(index);
        }

        let index = self.cache.projects.as_ref().ok_or_else(|| {
            EnvgateError::secret(secret, "bws project list produced no index")
        })?;
        if let Some(id) = index.by_name.get(project) {
            return Ok(id.clone());
        }
        if index.ids.contains(project) {
            return Ok(project.to_string());
        }
        Err(EnvgateError::secret(
            secret,
            format!("bws project not found: '{}'", project),
        ))
    }

    fn secret_id(&mut self, secret: &str, project_id: &str, key: &str) -> EnvgateResult<String> {
        if !self.cache.secret_ids.contains_key(project_id) {
            let listed: Vec<SecretEntry> =
                self.run_json(secret, &["secret", "list", project_id])?;
            let keys = listed.into_iter().map(|s| (s.key, s.id)).collect();
            self.cache.secret_ids.insert(project_id.to_string(), keys);
        }

        self.cache
            .secret_ids
            .get(project_id)
            .and_then(|keys| keys.get(key))
            .cloned()
            .ok_or_else(|| {
                EnvgateError::secret(
                    secret,
                    format!("bws secret key not found in project '{}': '{}'", project_id, key),
                )
            })
    }

    /// Resolve a request to its bws secret id
    fn locate(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<String> {
        let SecretBackendConfig::Bws {
            scope,
            project,
            key,
        } = request.config
        else {
            return Err(EnvgateError::secret(request.name, "not a bws backend reference"));
        };

        if !self.token_present {
            return Err(EnvgateError::secret(
                request.name,
                format!(
                    "bws backend requires {} in the environment",
                    self.settings.access_token_env
                ),
            ));
        }

        let project = match project.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p.to_string(),
            None => self
                .settings
                .project_name_for(request.env)
                .map_err(|e| EnvgateError::secret(request.name, e))?
                .to_string(),
        };
        let key = match key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => k.to_string(),
            None => self.settings.key_for(*scope, request.env, request.name),
        };

        let project_id = self.project_id(request.name, &project)?;
        self.secret_id(request.name, &project_id, &key)
    }
}

impl SecretBackend for BwsBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Bws
    }

    fn check(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<()> {
        self.locate(request).map(|_| ())
    }

    fn resolve(&mut self, request: &SecretRequest<'_>) -> EnvgateResult<SecretValue> {
        let id = self.locate(request)?;
        let payload: SecretPayload = self.run_json(request.name, &["secret", "get", id.as_str()])?;
        Ok(SecretValue::new(payload.value.trim_end_matches('\n')))
    }
}
