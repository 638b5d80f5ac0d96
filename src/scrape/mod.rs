//! Scrape orchestration
//!
//! One scrape cycle runs per inbound `/metrics` request (pull-based,
//! matching how Prometheus schedules collection; there is no internal
//! ticker): discover devices, filter against the cooldown tracker, fan
//! out bounded probe tasks, collect every result, and build an immutable
//! snapshot for the metrics layer.
//!
//! # Guarantees
//!
//! - A scrape never partially completes: every hdd that was eligible for
//!   probing yields a result (possibly error) before the snapshot is
//!   built.
//! - At most `max_concurrency` probe commands run at any instant.
//! - Devices cooling down after a timeout are short-circuited into the
//!   result set with their last known state and never dispatched.
//! - Probe tasks are spawned, so an HTTP caller disconnecting does not
//!   interrupt cooldown bookkeeping; dispatched probes finish or die at
//!   their own timeout.

pub mod cooldown;
pub mod discovery;
pub mod probe;

use crate::config::ProbeConfig;
use cooldown::CooldownTracker;
use discovery::{Device, DeviceSource, MediaType};
use futures_util::future::join_all;
use probe::{ProbeExecutor, ProbeRunner, STATE_UNKNOWN};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// One device's row in a snapshot.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub device_id: String,
    pub dev_path: String,
    pub media_type: MediaType,
    pub state_code: i64,
    pub power_mode: Option<String>,
    /// False for informational entries (non-hdd media) and devices
    /// skipped while cooling down.
    pub probed: bool,
}

/// Per-scrape device accounting, logged and exported as gauges.
#[derive(Debug, Clone, Default)]
pub struct ScrapeStats {
    pub enumerated: usize,
    pub probed_hdds: usize,
    pub skipped_cooldown: usize,
    pub skipped_non_rotational: usize,
    pub skipped_virtual: usize,
    pub duration: Duration,
}

/// Immutable result set of one scrape cycle. Never mutated after
/// construction; superseded wholesale by the next scrape.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub devices: Vec<DeviceEntry>,
    pub stats: ScrapeStats,
}

/// Drives the discover → filter → probe → collect pipeline.
pub struct ScrapeEngine<S, R> {
    source: S,
    executor: Arc<ProbeExecutor<R>>,
    cooldown: Arc<CooldownTracker>,
    max_concurrency: usize,
    cooldown_window: Duration,
}

impl<S: DeviceSource, R: ProbeRunner> ScrapeEngine<S, R> {
    pub fn new(config: &ProbeConfig, source: S, runner: R) -> Self {
        Self {
            source,
            executor: Arc::new(ProbeExecutor::new(runner, config)),
            cooldown: Arc::new(CooldownTracker::new()),
            max_concurrency: config.max_concurrency,
            cooldown_window: config.cooldown(),
        }
    }

    /// Runs one full scrape cycle and returns its snapshot.
    ///
    /// Individual device failures are folded into the result set; this
    /// method itself cannot fail.
    pub async fn scrape(&self) -> MetricsSnapshot {
        let started = Instant::now();

        let devices = self.source.discover();
        let mut stats = ScrapeStats {
            enumerated: devices.len(),
            ..ScrapeStats::default()
        };

        let mut entries = Vec::with_capacity(devices.len());
        let mut to_probe = Vec::new();
        let now = Instant::now();

        for device in devices {
            match device.media_type {
                MediaType::Hdd => {
                    if self.cooldown.is_eligible(&device.id, now) {
                        to_probe.push(device);
                    } else {
                        stats.skipped_cooldown += 1;
                        let state = self
                            .cooldown
                            .last_known_state(&device.id)
                            .unwrap_or(STATE_UNKNOWN);
                        entries.push(DeviceEntry {
                            device_id: device.id,
                            dev_path: device.dev_path,
                            media_type: device.media_type,
                            state_code: state,
                            power_mode: None,
                            probed: false,
                        });
                    }
                }
                MediaType::Virtual => {
                    stats.skipped_virtual += 1;
                    entries.push(informational(device));
                }
                MediaType::Ssd | MediaType::Unknown => {
                    stats.skipped_non_rotational += 1;
                    entries.push(informational(device));
                }
            }
        }

        stats.probed_hdds = to_probe.len();

        // Bounded fan-out: permits cap simultaneous probe commands,
        // devices queue in discovery order as slots free up.
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(to_probe.len());
        for device in to_probe {
            let semaphore = semaphore.clone();
            let executor = self.executor.clone();
            let cooldown = self.cooldown.clone();
            let window = self.cooldown_window;
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed while tasks hold a clone.
                let _permit = semaphore.acquire_owned().await.ok();

                let result = executor.probe(&device).await;
                if result.timed_out {
                    warn!(
                        "[{}] probe timed out, cooling down for {:?}",
                        device.id, window
                    );
                    cooldown.record_timeout(&device.id, Instant::now(), window);
                } else if result.state_code >= 0 {
                    cooldown.record_success(&device.id, result.state_code);
                }
                (device, result)
            }));
        }

        for joined in join_all(handles).await {
            match joined {
                Ok((device, result)) => entries.push(DeviceEntry {
                    device_id: result.device_id,
                    dev_path: device.dev_path,
                    media_type: device.media_type,
                    state_code: result.state_code,
                    power_mode: result.power_mode,
                    probed: true,
                }),
                Err(e) => warn!("probe task failed to complete: {}", e),
            }
        }

        entries.sort_by(|a, b| a.device_id.cmp(&b.device_id));

        stats.duration = started.elapsed();
        info!(
            "scrape complete: enumerated={} probed_hdds={} skipped_cooldown={} \
             skipped_non_rotational={} skipped_virtual={} duration={:.3}s",
            stats.enumerated,
            stats.probed_hdds,
            stats.skipped_cooldown,
            stats.skipped_non_rotational,
            stats.skipped_virtual,
            stats.duration.as_secs_f64()
        );

        MetricsSnapshot {
            devices: entries,
            stats,
        }
    }
}

/// Non-hdd and unclassifiable devices are reported without a probe.
fn informational(device: Device) -> DeviceEntry {
    DeviceEntry {
        device_id: device.id,
        dev_path: device.dev_path,
        media_type: device.media_type,
        state_code: STATE_UNKNOWN,
        power_mode: None,
        probed: false,
    }
}
