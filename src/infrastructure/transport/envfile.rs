//! Env-file rendering
//!
//! Output is a pure function of the materialized map: sorted keys, a header
//! without timestamps, and one `KEY="value"` line per variable. Identical
//! inputs therefore hash identically across applies.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::domain::value_objects::ContentHash;

/// Rendered env file. Holds secret values; `Debug` never prints the content.
pub struct EnvFilePayload {
    content: Vec<u8>,
    pub sha256: ContentHash,
    pub bytes: u64,
}

impl EnvFilePayload {
    pub fn new(content: String) -> Self {
        let content = content.into_bytes();
        Self {
            sha256: ContentHash::from_bytes(&content),
            bytes: content.len() as u64,
            content,
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl fmt::Debug for EnvFilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvFilePayload")
            .field("sha256", &self.sha256)
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

/// Render an env file for `env` from a fully materialized map
pub fn render_env_file(env: &str, runtime: &str, values: &BTreeMap<String, Value>) -> String {
    let mut out = String::new();
    out.push_str("# Generated by envgate. Do not edit; changes are overwritten on apply.\n");
    out.push_str(&format!("# env: {}  runtime: {}\n", env, runtime));
    out.push('\n');
    for (key, value) in values {
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(&scalar(value)));
        out.push_str("\"\n");
    }
    out
}

/// Plain text form of a value: strings verbatim, structures as compact JSON
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
