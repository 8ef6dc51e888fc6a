//! Secret-reference entity
//!
//! Per-environment secret-reference documents map a secret name to the
//! backend that holds it. A reference never carries the secret itself:
//! a literal `value` (or legacy `ref`) key is rejected outright.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EnvgateError, EnvgateResult};

/// Check that a secret name is a single safe path segment
///
/// Names are ASCII alphanumerics plus `-`, `_` and `.`, start with an
/// alphanumeric and never contain `..`. Backends use the name as a file name.
pub fn validate_secret_name(field: &str, name: &str) -> EnvgateResult<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.contains("..");
    if valid {
        Ok(())
    } else {
        Err(EnvgateError::schema(
            field,
            format!("invalid secret name '{}': use letters, digits, '-', '_' or '.'", name),
        ))
    }
}

/// Secret-reference document: secret name -> backend definition
pub type SecretRefsDocument = BTreeMap<String, SecretRefDocument>;

/// One secret reference as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretRefDocument {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub env_var: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub value: bool,
    #[serde(rename = "ref", default, deserialize_with = "present")]
    pub legacy_ref: bool,
}

/// Records that a key was present, whatever it held.
///
/// Consumes the value as `serde_json::Value` so strict loaders do not
/// report the key as unknown.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    serde_json::Value::deserialize(deserializer).map(|_| true)
}

/// Kind of secret backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Mock,
    Env,
    File,
    Bws,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mock => "mock",
            BackendKind::Env => "env",
            BackendKind::File => "file",
            BackendKind::Bws => "bws",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock" => Ok(BackendKind::Mock),
            "env" => Ok(BackendKind::Env),
            "file" => Ok(BackendKind::File),
            "bws" => Ok(BackendKind::Bws),
            other => Err(format!(
                "unknown backend '{}' (expected mock, env, file or bws)",
                other
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sharing scope of a bws secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BwsScope {
    /// Lives under the per-environment project prefix
    #[default]
    Project,
    /// Lives under the shared prefix
    Shared,
}

impl BwsScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BwsScope::Project => "project",
            BwsScope::Shared => "shared",
        }
    }
}

/// A validated secret backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretBackendConfig {
    Mock,
    Env {
        env_var: String,
    },
    File {
        path: PathBuf,
    },
    Bws {
        scope: BwsScope,
        project: Option<String>,
        key: Option<String>,
    },
}

impl SecretBackendConfig {
    /// Validate a secret reference document
    pub fn from_document(name: &str, doc: SecretRefDocument) -> EnvgateResult<Self> {
        let at = |field: &str| format!("secrets.{}.{}", name, field);
        validate_secret_name(&format!("secrets.{}", name), name)?;

        if doc.value {
            return Err(EnvgateError::schema(
                at("value"),
                "literal secret values are forbidden; reference a backend instead",
            ));
        }
        if doc.legacy_ref {
            return Err(EnvgateError::schema(
                at("ref"),
                "the legacy 'ref' key is no longer supported; use backend-specific fields",
            ));
        }

        let backend: BackendKind = doc
            .backend
            .as_deref()
            .ok_or_else(|| EnvgateError::schema(at("backend"), "backend is required"))?
            .parse()
            .map_err(|e: String| EnvgateError::schema(at("backend"), e))?;

        let reject = |field: &str, set: bool| -> EnvgateResult<()> {
            if set {
                Err(EnvgateError::schema(
                    at(field),
                    format!("not valid for backend '{}'", backend),
                ))
            } else {
                Ok(())
            }
        };

        match backend {
            BackendKind::Mock => {
                reject("env_var", doc.env_var.is_some())?;
                reject("path", doc.path.is_some())?;
                reject("scope", doc.scope.is_some())?;
                reject("project", doc.project.is_some())?;
                reject("key", doc.key.is_some())?;
                Ok(SecretBackendConfig::Mock)
            }
            BackendKind::Env => {
                reject("path", doc.path.is_some())?;
                reject("scope", doc.scope.is_some())?;
                reject("project", doc.project.is_some())?;
                reject("key", doc.key.is_some())?;
                let env_var = doc
                    .env_var
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| EnvgateError::schema(at("env_var"), "env_var is required"))?;
                Ok(SecretBackendConfig::Env { env_var })
            }
            BackendKind::File => {
                reject("env_var", doc.env_var.is_some())?;
                reject("scope", doc.scope.is_some())?;
                reject("project", doc.project.is_some())?;
                reject("key", doc.key.is_some())?;
                let path = doc
                    .path
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| EnvgateError::schema(at("path"), "path is required"))?;
                Ok(SecretBackendConfig::File {
                    path: PathBuf::from(path),
                })
            }
            BackendKind::Bws => {
                reject("env_var", doc.env_var.is_some())?;
                reject("path", doc.path.is_some())?;
                let scope = match doc.scope.as_deref() {
                    None | Some("project") => BwsScope::Project,
                    Some("shared") => BwsScope::Shared,
                    Some(other) => {
                        return Err(EnvgateError::schema(
                            at("scope"),
                            format!("unknown scope '{}' (expected project or shared)", other),
                        ))
                    }
                };
                Ok(SecretBackendConfig::Bws {
                    scope,
                    project: doc.project,
                    key: doc.key,
                })
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            SecretBackendConfig::Mock => BackendKind::Mock,
            SecretBackendConfig::Env { .. } => BackendKind::Env,
            SecretBackendConfig::File { .. } => BackendKind::File,
            SecretBackendConfig::Bws { .. } => BackendKind::Bws,
        }
    }

    /// Value-free identifier of where the secret lives; safe to log and diff
    pub fn stable_ref(&self, name: &str, env: &str) -> String {
        match self {
            SecretBackendConfig::Mock => format!("mock:{}/{}", env, name),
            SecretBackendConfig::Env { env_var } => format!("env:{}", env_var),
            SecretBackendConfig::File { path } => format!("file:{}", path.display()),
            SecretBackendConfig::Bws {
                scope,
                project,
                key,
            } => format!(
                "bws:{}:{}:{}",
                scope.as_str(),
                project.as_deref().unwrap_or("-"),
                key.as_deref().unwrap_or(name)
            ),
        }
    }
}

/// Validate every entry of a secret-reference document
pub fn parse_secret_refs(
    doc: SecretRefsDocument,
) -> EnvgateResult<BTreeMap<String, SecretBackendConfig>> {
    doc.into_iter()
        .map(|(name, entry)| {
            let config = SecretBackendConfig::from_document(&name, entry)?;
            Ok((name, config))
        })
        .collect()
}
