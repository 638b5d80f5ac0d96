//! Disk Status Prometheus Exporter
//!
//! A Prometheus exporter that reports the power state of physical disks
//! (standby/idle/active) on TrueNAS and Proxmox hosts without waking
//! sleeping drives.
//!
//! # Overview
//!
//! Each scrape enumerates block devices from sysfs, resolves their
//! stable `/dev/disk/by-id` identities, and probes rotational disks with
//! `smartctl -n standby` under a bounded concurrency limit. Devices
//! whose probe timed out (usually disks mid spin-up) are placed on a
//! cooldown and skipped until the window lapses, so the exporter never
//! becomes the reason a disk cannot sleep.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   /metrics   ┌───────────────────────────────┐
//! │ Prometheus │ ◄──────────► │          Exporter             │
//! └────────────┘              │  ┌─────────┐   ┌───────────┐  │
//!                             │  │ Scrape  │──►│ smartctl  │──┼──► /dev/sdX
//!                             │  │ Engine  │   │ (bounded) │  │
//!                             │  └────┬────┘   └───────────┘  │
//!                             │       │  ┌──────────┐         │
//!                             │       └─►│ Cooldown │         │
//!                             │          └──────────┘         │
//!                             └───────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`scrape`] - Device discovery, probe execution, cooldown tracking,
//!   and scrape orchestration
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use disk_status_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod scrape;
pub mod server;
