//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnvgateError, EnvgateResult};
use crate::infrastructure::fs::expand_home;

use super::types::Config;

/// File looked up at the project root when `--config` is not given
pub const CONFIG_FILE: &str = "envgate.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (unknown keys).
pub fn load_with_warnings(path: &Path) -> EnvgateResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);
    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
                file: path.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load the explicit config file, else `<root>/envgate.toml`, else defaults.
///
/// An explicit path that does not exist is an error; a missing default file
/// is not. Environment overrides are applied last.
pub fn discover(root: &Path, explicit: Option<&Path>) -> EnvgateResult<(Config, Vec<ConfigWarning>)> {
    let loaded = match explicit {
        Some(path) => {
            let path = expand_home(&path.to_string_lossy());
            let path = if path.is_absolute() { path } else { root.join(path) };
            if !path.is_file() {
                return Err(EnvgateError::schema(
                    "--config",
                    format!("config file not found: {}", path.display()),
                ));
            }
            Some(load_with_warnings(&path)?)
        }
        None => {
            let path = root.join(CONFIG_FILE);
            if path.is_file() {
                Some(load_with_warnings(&path)?)
            } else {
                None
            }
        }
    };

    let (config, warnings) = loaded.unwrap_or_default();
    tracing::debug!(state_dir = %config.paths.state_dir.display(), "configuration loaded");
    Ok((with_env_overrides(config), warnings))
}

/// Apply environment variable overrides (ENVGATE_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    with_overrides_from(config, |key| std::env::var(key).ok())
}

pub(super) fn with_overrides_from(
    mut config: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Config {
    if let Some(dir) = lookup("ENVGATE_STATE_DIR").filter(|v| !v.trim().is_empty()) {
        config.paths.state_dir = expand_home(dir.trim());
    }
    if let Some(policy) = lookup("ENVGATE_POLICY").filter(|v| !v.trim().is_empty()) {
        config.paths.policy = expand_home(policy.trim());
    }
    config
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

pub(super) fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "paths",
        "contract",
        "values_dir",
        "secrets_dir",
        "policy",
        "state_dir",
        "env_selector",
        "healthcheck",
        "interval_secs",
        "timeout_secs",
    ];

    CANDIDATES
        .iter()
        .map(|candidate| (*candidate, levenshtein(unknown, candidate)))
        .min_by_key(|(_, dist)| *dist)
        .filter(|(_, dist)| *dist <= 2)
        .map(|(candidate, _)| candidate.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ac) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
