use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::error::ExporterError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    /// Probe attempts per device per scrape. Attempts exist for flaky
    /// links; the executor stops at the first definitive state.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Pause between attempts for the same device.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Deadline for one smartctl invocation; the process is killed on expiry.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Upper bound on simultaneously running probe commands per scrape.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// How long a timed-out device is excluded from probing.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_smartctl_path")]
    pub smartctl_path: String,
    /// Device type passed to smartctl via `-d`, avoiding autodetection.
    #[serde(default = "default_device_type")]
    pub device_type: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval_ms: default_interval_ms(),
            timeout_seconds: default_timeout_seconds(),
            max_concurrency: default_max_concurrency(),
            cooldown_seconds: default_cooldown_seconds(),
            smartctl_path: default_smartctl_path(),
            device_type: default_device_type(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9940
}

fn default_attempts() -> u32 {
    2
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_concurrency() -> usize {
    4
}

fn default_cooldown_seconds() -> u64 {
    300
}

fn default_smartctl_path() -> String {
    "smartctl".to_string()
}

fn default_device_type() -> String {
    "sat".to_string()
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("DISK_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make a scrape degenerate. Invalid
    /// configuration is fatal at startup, never discovered mid-scrape.
    pub fn validate(&self) -> std::result::Result<(), ExporterError> {
        if self.probe.attempts == 0 {
            return Err(ExporterError::Config(
                "probe.attempts must be at least 1".to_string(),
            ));
        }
        if self.probe.max_concurrency == 0 {
            return Err(ExporterError::Config(
                "probe.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.probe.timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "probe.timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
