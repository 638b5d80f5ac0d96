//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the exporter
//! and applies scrape snapshots to them.
//!
//! # Metric Families
//!
//! - `disk_power_state` - numeric power state per device
//!   (0=standby, 1=idle, 2=active_or_idle, -1=unknown, -2=error)
//! - `disk_power_mode_info` - raw smartctl mode string as a label, always 1
//! - `disk_info` - static per-device labels, always 1
//! - `disk_scrape_duration_seconds` - wall-clock duration of the last scrape
//! - `disk_scrape_devices` - device counts from the last scrape by class
//!
//! Metric names are kept compatible with existing dashboards and
//! alerting rules built against the original exporter.
//!
//! The labelled families are reset before each snapshot is applied so
//! devices that disappeared between scrapes drop out of the exposition
//! instead of going stale.

use prometheus::{Encoder, Gauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::scrape::MetricsSnapshot;

/// Metrics collector for disk power states
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    pub power_state: Arc<IntGaugeVec>,
    pub power_mode_info: Arc<IntGaugeVec>,
    pub disk_info: Arc<IntGaugeVec>,

    pub scrape_duration_seconds: Arc<Gauge>,
    pub scrape_devices: Arc<IntGaugeVec>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let power_state = IntGaugeVec::new(
            Opts::new(
                "power_state",
                "Current disk power state as a numeric code \
                 (0=standby, 1=idle, 2=active_or_idle, -1=unknown, -2=error)",
            )
            .namespace("disk"),
            &["device_id", "device", "type"],
        )?;

        let power_mode_info = IntGaugeVec::new(
            Opts::new(
                "power_mode_info",
                "Disk power mode as reported by smartctl (label state=...). Always 1.",
            )
            .namespace("disk"),
            &["device_id", "device", "type", "state"],
        )?;

        let disk_info = IntGaugeVec::new(
            Opts::new("info", "Static labels describing the disk. Always 1.").namespace("disk"),
            &["device_id", "device", "type"],
        )?;

        let scrape_duration_seconds = Gauge::new(
            "disk_scrape_duration_seconds",
            "Wall-clock duration of the last scrape in seconds",
        )?;

        let scrape_devices = IntGaugeVec::new(
            Opts::new(
                "scrape_devices",
                "Device counts from the last scrape by classification",
            )
            .namespace("disk"),
            &["class"],
        )?;

        // Register all metrics
        registry.register(Box::new(power_state.clone()))?;
        registry.register(Box::new(power_mode_info.clone()))?;
        registry.register(Box::new(disk_info.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(scrape_devices.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            power_state: Arc::new(power_state),
            power_mode_info: Arc::new(power_mode_info),
            disk_info: Arc::new(disk_info),
            scrape_duration_seconds: Arc::new(scrape_duration_seconds),
            scrape_devices: Arc::new(scrape_devices),
        })
    }

    /// Applies one scrape's snapshot, superseding the previous one wholesale.
    pub fn apply(&self, snapshot: &MetricsSnapshot) {
        self.power_state.reset();
        self.power_mode_info.reset();
        self.disk_info.reset();

        for entry in &snapshot.devices {
            let labels = [
                entry.device_id.as_str(),
                entry.dev_path.as_str(),
                entry.media_type.as_str(),
            ];

            self.disk_info.with_label_values(&labels).set(1);
            self.power_state
                .with_label_values(&labels)
                .set(entry.state_code);

            if let Some(mode) = &entry.power_mode {
                self.power_mode_info
                    .with_label_values(&[
                        entry.device_id.as_str(),
                        entry.dev_path.as_str(),
                        entry.media_type.as_str(),
                        mode.as_str(),
                    ])
                    .set(1);
            }
        }

        let stats = &snapshot.stats;
        self.scrape_duration_seconds
            .set(stats.duration.as_secs_f64());
        self.scrape_devices
            .with_label_values(&["enumerated"])
            .set(stats.enumerated as i64);
        self.scrape_devices
            .with_label_values(&["probed"])
            .set(stats.probed_hdds as i64);
        self.scrape_devices
            .with_label_values(&["skipped_cooldown"])
            .set(stats.skipped_cooldown as i64);
        self.scrape_devices
            .with_label_values(&["skipped_non_rotational"])
            .set(stats.skipped_non_rotational as i64);
        self.scrape_devices
            .with_label_values(&["skipped_virtual"])
            .set(stats.skipped_virtual as i64);
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}
