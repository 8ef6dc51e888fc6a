//! Output Rendering
//!
//! Every command result renders either as text for humans or as one pretty
//! JSON document for scripting. Secret values never reach this layer; secrets
//! are shown by their stable reference.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::application::{
    ApplyResult, CompileResult, DecommissionResult, DoctorResult, PlanResult, RotateResult,
    VerifyResult,
};
use crate::domain::services::StateDiff;

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Human-readable rendering of a command result
pub trait TextReport {
    fn text(&self) -> String;
}

/// Render a result in the requested format
pub fn render<T: Serialize + TextReport>(format: OutputFormat, result: &T) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result),
        OutputFormat::Text => Ok(result.text()),
    }
}

/// Print a result to stdout and its warnings to stderr
pub fn emit<T: Serialize + TextReport>(
    format: OutputFormat,
    result: &T,
    warnings: &[String],
) -> serde_json::Result<()> {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    let out = render(format, result)?;
    println!("{}", out.trim_end());
    Ok(())
}

fn show_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_diff(out: &mut String, diff: &StateDiff) {
    let _ = writeln!(out, "{} {}: {}", diff.provider, diff.env, diff.summary());

    let config = &diff.config;
    for (key, value) in &config.added {
        let _ = writeln!(out, "  + {} = {}", key, show_value(value));
    }
    for (key, change) in &config.changed {
        let _ = writeln!(
            out,
            "  ~ {}: {} -> {}",
            key,
            show_value(&change.from),
            show_value(&change.to)
        );
    }
    for key in config.removed.keys() {
        let _ = writeln!(out, "  - {}", key);
    }

    let secrets = &diff.secrets;
    for (name, secret) in &secrets.added {
        let _ = writeln!(out, "  + secret {} ({})", name, secret.stable_ref);
    }
    for (name, change) in &secrets.changed {
        let _ = writeln!(
            out,
            "  ~ secret {}: {} -> {}",
            name, change.from.stable_ref, change.to.stable_ref
        );
    }
    for name in secrets.removed.keys() {
        let _ = writeln!(out, "  - secret {}", name);
    }
}

impl TextReport for PlanResult {
    fn text(&self) -> String {
        let mut out = String::new();
        write_diff(&mut out, &self.diff);
        let _ = write!(out, "  runtime: {}", self.runtime);
        if let Some(rule) = &self.target_rule {
            let _ = write!(out, " (rule {})", rule);
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "  auth: {}, preflight: {}",
            self.decision.auth_mode, self.decision.preflight_mode
        );
        out
    }
}

impl TextReport for ApplyResult {
    fn text(&self) -> String {
        let mut out = String::new();
        write_diff(&mut out, &self.diff);
        if let Some(file) = &self.delivered {
            if file.hosts.is_empty() {
                let _ = writeln!(out, "  delivered {} ({} bytes, {})", file.path, file.bytes, file.sha256);
            } else {
                let _ = writeln!(
                    out,
                    "  delivered {} to {} ({} bytes, {})",
                    file.path,
                    file.hosts.join(", "),
                    file.bytes,
                    file.sha256
                );
            }
        }
        if let Some(status) = self.healthcheck_status {
            let _ = writeln!(out, "  healthcheck: HTTP {}", status);
        }
        if let Some(path) = &self.evidence {
            let _ = writeln!(out, "  evidence: {}", path.display());
        }
        let _ = writeln!(out, "  recorded {}", self.record_path.display());
        let _ = writeln!(out, "  context {}", self.context.display());
        out
    }
}

impl TextReport for CompileResult {
    fn text(&self) -> String {
        let mut out = String::new();
        let secrets = self.keys.iter().filter(|k| k.secret).count();
        let _ = writeln!(
            out,
            "{} ({}): {} keys, {} secret",
            self.env,
            self.runtime,
            self.keys.len(),
            secrets
        );
        match &self.env_file {
            Some(path) => {
                let _ = writeln!(out, "  env file {}", path.display());
            }
            None => out.push_str("  env file not written\n"),
        }
        if let Some(path) = &self.context {
            let _ = writeln!(out, "  context {}", path.display());
        }
        out
    }
}

impl TextReport for VerifyResult {
    fn text(&self) -> String {
        let mut out = String::new();
        write_diff(&mut out, &self.diff);
        for check in &self.hashes {
            let status = match &check.actual {
                _ if check.matches() => "ok",
                Some(_) => "MISMATCH",
                None => "MISSING",
            };
            let _ = writeln!(out, "  {} {}:{}", status, check.host, check.path);
        }
        for host in &self.unverified {
            let _ = writeln!(out, "  UNVERIFIED {} (no longer configured)", host);
        }
        if self.remote_skipped {
            out.push_str("  remote copies not checked (use --check-remote --approve-remote)\n");
        }
        out.push_str(if self.is_clean() { "verified\n" } else { "NOT verified\n" });
        out
    }
}

impl TextReport for RotateResult {
    fn text(&self) -> String {
        format!(
            "rotated {} in {} (version {}, {})\n",
            self.secret,
            self.env,
            self.version,
            self.rotated_at.to_rfc3339()
        )
    }
}

impl TextReport for DecommissionResult {
    fn text(&self) -> String {
        if self.deleted {
            format!("decommissioned {} (removed {})\n", self.env, self.record_path.display())
        } else {
            format!("{} has no deployed state; nothing to do\n", self.env)
        }
    }
}

impl TextReport for DoctorResult {
    fn text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {} ({})", self.provider, self.env, self.runtime);
        for status in &self.secrets {
            match &status.problem {
                None => {
                    let _ = writeln!(out, "  ok   {} ({})", status.secret, status.stable_ref);
                }
                Some(problem) => {
                    let _ = writeln!(out, "  FAIL {} ({}): {}", status.secret, status.stable_ref, problem);
                }
            }
        }
        if self.is_healthy() {
            out.push_str("all secrets resolvable\n");
        } else {
            let _ = writeln!(out, "{} secret(s) unresolvable", self.problems());
        }
        out
    }
}
