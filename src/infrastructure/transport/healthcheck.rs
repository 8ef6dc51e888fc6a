//! Health check polling through `curl`
//!
//! The URL is polled at a fixed interval until it answers 2xx/3xx or the
//! deadline passes.

use std::thread;
use std::time::{Duration, Instant};

use crate::domain::entities::Healthcheck;
use crate::domain::ports::CommandRunner;
use crate::error::{EnvgateError, EnvgateResult};

/// Interval and deadline used when the target does not set them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthcheckTiming {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HealthcheckTiming {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            timeout_secs: 30,
        }
    }
}

/// Poll until healthy. Returns the final HTTP status.
///
/// Polling stops at a wall-clock deadline of `timeout` after the first
/// attempt started; each curl call is capped at the time remaining. A zero
/// timeout makes exactly one attempt bounded by the interval.
pub fn wait_healthy(
    runner: &dyn CommandRunner,
    check: &Healthcheck,
    defaults: HealthcheckTiming,
) -> EnvgateResult<u16> {
    let interval = Duration::from_secs(check.interval_secs.unwrap_or(defaults.interval_secs).max(1));
    let timeout = Duration::from_secs(check.timeout_secs.unwrap_or(defaults.timeout_secs));
    let deadline = Instant::now() + timeout;

    let mut last = String::from("no response");
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let max_time = if remaining.is_zero() {
            interval
        } else {
            remaining.min(interval)
        };

        match poll_once(runner, &check.url, max_time) {
            Ok(status) if (200..400).contains(&status) => {
                tracing::info!(url = %check.url, status, attempt, "health check passed");
                return Ok(status);
            }
            Ok(status) => last = format!("HTTP {}", status),
            Err(e) => last = e,
        }
        tracing::debug!(url = %check.url, attempt, last = %last, "health check pending");

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(interval));
        if Instant::now() >= deadline {
            break;
        }
    }

    Err(EnvgateError::Healthcheck {
        url: check.url.clone(),
        message: format!("{} after {} attempt(s)", last, attempt),
    })
}

fn poll_once(runner: &dyn CommandRunner, url: &str, max_time: Duration) -> Result<u16, String> {
    let args: Vec<String> = vec![
        "-s".into(),
        "-o".into(),
        "/dev/null".into(),
        "-w".into(),
        "%{http_code}".into(),
        "--max-time".into(),
        format!("{:.3}", max_time.as_secs_f64()),
        url.to_string(),
    ];

    let output = runner
        .run("curl", &args, None)
        .map_err(|e| format!("could not run curl: {}", e))?;
    let code = output.stdout_str().trim().parse::<u16>().unwrap_or(0);
    if code == 0 {
        return Err(format!("curl {}", output.exit_label()));
    }
    Ok(code)
}
