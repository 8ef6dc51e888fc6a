//! Strict YAML document loading
//!
//! Every document kind is deserialized through `serde_ignored`, so a key the
//! schema does not know is reported at its full dotted path and rejected
//! instead of being silently dropped.

use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{EnvgateError, EnvgateResult};

/// Parse a YAML document, rejecting unknown keys.
///
/// `name` labels parse errors (e.g. `policy.yaml`); `prefix` is prepended to
/// the dotted path of an unknown key (e.g. `secrets`).
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    name: &str,
    prefix: &str,
) -> EnvgateResult<T> {
    let content = if is_blank(content) { "{}" } else { content };

    let mut unknown: Vec<String> = Vec::new();
    let deserializer = serde_yaml_ng::Deserializer::from_str(content);
    let doc: T = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(clean_path(&path.to_string()));
    })
    .map_err(|e| EnvgateError::schema(name, e.to_string()))?;

    if let Some(first) = unknown.first() {
        let path = if prefix.is_empty() {
            first.clone()
        } else {
            format!("{}.{}", prefix, first)
        };
        return Err(EnvgateError::schema(path, "unknown key"));
    }

    Ok(doc)
}

/// Read and parse a document. Returns `None` if the file does not exist.
pub fn read_document<T: DeserializeOwned>(
    path: &Path,
    name: &str,
    prefix: &str,
) -> EnvgateResult<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(path = %path.display(), "loaded {}", name);
    parse_document(&content, name, prefix).map(Some)
}

/// Empty or comment-only documents parse as an empty mapping
fn is_blank(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

/// `serde_ignored` marks `Option` layers with `?`; drop them from the path
fn clean_path(raw: &str) -> String {
    raw.split('.')
        .filter(|segment| *segment != "?")
        .collect::<Vec<_>>()
        .join(".")
}
