//! smartctl probe execution and power-mode classification
//!
//! The probe command is `smartctl -n standby -d <type> -i <dev>`:
//! `-n standby` makes smartctl refuse to touch a spun-down disk instead
//! of waking it, and the explicit `-d` device type skips autodetection
//! probes that carry the same wake risk.
//!
//! # State codes
//!
//! The numeric mapping is kept for compatibility with existing
//! Prometheus rules:
//!
//! | code | meaning        |
//! |------|----------------|
//! | -2   | error          |
//! | -1   | unknown        |
//! |  0   | standby/sleep  |
//! |  1   | idle           |
//! |  2   | active or idle |

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::scrape::discovery::Device;
use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

pub const STATE_ERROR: i64 = -2;
pub const STATE_UNKNOWN: i64 = -1;
pub const STATE_STANDBY: i64 = 0;
pub const STATE_IDLE: i64 = 1;
pub const STATE_ACTIVE_OR_IDLE: i64 = 2;

/// Raw outcome of one probe command invocation.
#[derive(Debug, Clone)]
pub struct RawProbe {
    pub stdout: String,
    pub exit_ok: bool,
}

/// Outcome of one probe (up to `attempts` invocations) for one device.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub device_id: String,
    pub state_code: i64,
    /// Raw mode string from smartctl when one was parsed.
    pub power_mode: Option<String>,
    /// True when the final outcome was caused by the command exceeding
    /// its deadline. Implies `state_code` is error or unknown.
    pub timed_out: bool,
    pub observed_at: SystemTime,
}

/// Seam between the executor and the external diagnostic command.
pub trait ProbeRunner: Send + Sync + 'static {
    fn run_once(
        &self,
        device: &Device,
        deadline: Duration,
    ) -> impl Future<Output = Result<RawProbe, ProbeError>> + Send;
}

/// Invokes the real smartctl binary.
pub struct SmartctlRunner {
    smartctl_path: String,
    device_type: String,
}

impl SmartctlRunner {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            smartctl_path: config.smartctl_path.clone(),
            device_type: config.device_type.clone(),
        }
    }
}

impl ProbeRunner for SmartctlRunner {
    async fn run_once(&self, device: &Device, deadline: Duration) -> Result<RawProbe, ProbeError> {
        let child = Command::new(&self.smartctl_path)
            .arg("-n")
            .arg("standby")
            .arg("-d")
            .arg(&self.device_type)
            .arg("-i")
            .arg(&device.dev_path)
            .env("LANG", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(ProbeError::Execution)?;

        // On deadline expiry the output future is dropped and the child
        // is killed via kill_on_drop, never merely abandoned.
        match timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(RawProbe {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                exit_ok: output.status.success(),
            }),
            Ok(Err(e)) => Err(ProbeError::Execution(e)),
            Err(_) => Err(ProbeError::Timeout { elapsed: deadline }),
        }
    }
}

/// Extracts the raw power mode string from smartctl stdout, if present.
///
/// Two shapes occur: the info block's `Power mode is: IDLE_A` line, and
/// the `-n standby` refusal line `Device is in STANDBY mode, exit(2)`
/// printed instead of the info block when the check trips.
pub fn parse_power_mode(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let line = line.trim();

        if let Some(rest) = line
            .strip_prefix("Power mode is:")
            .or_else(|| line.strip_prefix("Power mode was:"))
        {
            let mode = rest.trim();
            if !mode.is_empty() {
                return Some(mode.to_string());
            }
        }

        if let Some(rest) = line.strip_prefix("Device is in ") {
            if let Some(mode) = rest.split(" mode").next() {
                if !mode.is_empty()
                    && mode
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c == '_' || c == ' ')
                {
                    return Some(mode.to_string());
                }
            }
        }
    }
    None
}

/// Maps a raw smartctl power mode onto the numeric state-code space.
/// SLEEP is treated like STANDBY (spun down); plain ACTIVE cannot be
/// distinguished further and maps with ACTIVE or IDLE.
pub fn state_code_for(mode: &str) -> i64 {
    match mode.to_uppercase().as_str() {
        "STANDBY" | "SLEEP" => STATE_STANDBY,
        "IDLE" | "IDLE_A" | "IDLE_B" | "IDLE_C" => STATE_IDLE,
        "ACTIVE OR IDLE" | "ACTIVE/IDLE" | "ACTIVE" => STATE_ACTIVE_OR_IDLE,
        _ => STATE_UNKNOWN,
    }
}

/// Classifies one raw invocation into a state code and mode string.
///
/// A power mode parsed from stdout wins even on a non-zero exit:
/// smartctl exits 2 when the `-n standby` check trips on a sleeping
/// disk while still reporting the mode.
fn classify(raw: RawProbe) -> Result<(i64, String), ProbeError> {
    match parse_power_mode(&raw.stdout) {
        Some(mode) => Ok((state_code_for(&mode), mode)),
        None if raw.exit_ok => Err(ProbeError::UnparseableOutput),
        None => Err(ProbeError::ExitFailure),
    }
}

/// Drives up to `attempts` invocations of a [`ProbeRunner`] for one
/// device and classifies the outcome.
pub struct ProbeExecutor<R> {
    runner: R,
    attempts: u32,
    interval: Duration,
    attempt_timeout: Duration,
}

impl<R: ProbeRunner> ProbeExecutor<R> {
    pub fn new(runner: R, config: &ProbeConfig) -> Self {
        Self {
            runner,
            attempts: config.attempts,
            interval: config.interval(),
            attempt_timeout: config.timeout(),
        }
    }

    /// Probes one device, stopping at the first attempt that returns a
    /// definitive state. Wall time is bounded by
    /// `timeout * attempts + interval * (attempts - 1)`.
    pub async fn probe(&self, device: &Device) -> ProbeResult {
        let mut timed_out = false;
        let mut last_state = STATE_ERROR;
        let mut last_mode = None;

        for attempt in 1..=self.attempts {
            if attempt > 1 {
                tokio::time::sleep(self.interval).await;
            }

            let outcome = self
                .runner
                .run_once(device, self.attempt_timeout)
                .await
                .and_then(classify);

            match outcome {
                Ok((code, mode)) if code >= 0 => {
                    debug!("[{}] power mode {} (code {})", device.id, mode, code);
                    return ProbeResult {
                        device_id: device.id.clone(),
                        state_code: code,
                        power_mode: Some(mode),
                        timed_out: false,
                        observed_at: SystemTime::now(),
                    };
                }
                Ok((code, mode)) => {
                    warn!(
                        "[{}] unrecognized power mode {:?} (attempt {}/{})",
                        device.id, mode, attempt, self.attempts
                    );
                    last_state = code;
                    last_mode = Some(mode);
                }
                Err(e) => {
                    if e.is_timeout() {
                        timed_out = true;
                    }
                    warn!(
                        "[{}] probe attempt {}/{} failed: {}",
                        device.id, attempt, self.attempts, e
                    );
                    last_state = STATE_ERROR;
                    last_mode = None;
                }
            }
        }

        ProbeResult {
            device_id: device.id.clone(),
            state_code: last_state,
            power_mode: last_mode,
            timed_out,
            observed_at: SystemTime::now(),
        }
    }
}
