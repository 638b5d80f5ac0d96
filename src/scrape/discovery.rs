//! Block-device discovery
//!
//! Enumerates candidate physical devices from sysfs and resolves stable
//! identifiers from `/dev/disk/by-id`. Devices are re-discovered fresh on
//! every scrape; nothing is cached between cycles.
//!
//! # Classification
//!
//! - `hdd` / `ssd` from `/sys/block/<kname>/queue/rotational`
//! - `virtual` for QEMU/virtio devices (Proxmox guests), detected from
//!   the sysfs vendor/model attributes or the by-id link name
//! - `unknown` when the rotational flag is unreadable
//!
//! Only `hdd` devices are probed; the rest are reported informationally.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Media classification derived from host-level signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Hdd,
    Ssd,
    Virtual,
    Unknown,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hdd => "hdd",
            Self::Ssd => "ssd",
            Self::Virtual => "virtual",
            Self::Unknown => "unknown",
        }
    }
}

/// One physical storage device, valid for a single scrape cycle.
#[derive(Debug, Clone)]
pub struct Device {
    /// Stable identifier: a `/dev/disk/by-id` symlink when one exists,
    /// the raw `/dev/<kname>` path otherwise. Unique within a scrape.
    pub id: String,
    /// Raw device node handed to the probe command.
    pub dev_path: String,
    pub media_type: MediaType,
}

/// Source of candidate devices for one scrape.
pub trait DeviceSource: Send + Sync + 'static {
    fn discover(&self) -> Vec<Device>;
}

// Virtual and pseudo devices that are never physical disks.
const SKIP_KNAME_PREFIXES: &[&str] = &["loop", "ram", "fd", "sr", "dm-"];

const PREFERRED_ID_PREFIXES: &[&str] = &["ata-", "scsi-", "wwn-", "nvme-", "usb-", "virtio-"];

const VIRTUAL_ID_PREFIXES: &[&str] = &["scsi-0QEMU_", "ata-QEMU_", "virtio-"];

/// Sysfs-backed device discovery.
pub struct Discovery {
    sys_block: PathBuf,
    dev_dir: PathBuf,
    by_id_dir: PathBuf,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery {
    pub fn new() -> Self {
        Self::with_roots("/sys/block", "/dev", "/dev/disk/by-id")
    }

    /// Discovery rooted at alternate trees, for tests and for containers
    /// that bind-mount the host paths elsewhere.
    pub fn with_roots(
        sys_block: impl Into<PathBuf>,
        dev_dir: impl Into<PathBuf>,
        by_id_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sys_block: sys_block.into(),
            dev_dir: dev_dir.into(),
            by_id_dir: by_id_dir.into(),
        }
    }

    /// Enumerates block devices in kernel-name order.
    ///
    /// A missing or unreadable sysfs tree degrades to an empty list; a
    /// scrape with zero devices is valid and observable.
    fn enumerate(&self) -> Vec<Device> {
        let entries = match fs::read_dir(&self.sys_block) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Device discovery unavailable ({}): {}",
                    self.sys_block.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut knames: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        knames.sort();

        let mut devices = Vec::new();
        for kname in knames {
            if SKIP_KNAME_PREFIXES
                .iter()
                .any(|prefix| kname.starts_with(prefix))
            {
                continue;
            }

            let dev_path = self.dev_dir.join(&kname);
            if !dev_path.exists() {
                continue;
            }

            let id = self.persistent_id(&dev_path);
            let media_type = self.classify(&kname, &id);
            devices.push(Device {
                id,
                dev_path: dev_path.to_string_lossy().into_owned(),
                media_type,
            });
        }
        devices
    }

    fn classify(&self, kname: &str, id: &str) -> MediaType {
        if self.is_virtual(kname, id) {
            return MediaType::Virtual;
        }
        self.rotational_type(kname)
    }

    /// `hdd` if rotational==1, `ssd` if 0, `unknown` when unreadable.
    fn rotational_type(&self, kname: &str) -> MediaType {
        let path = self.sys_block.join(kname).join("queue/rotational");
        match fs::read_to_string(&path) {
            Ok(value) if value.trim() == "1" => MediaType::Hdd,
            Ok(_) => MediaType::Ssd,
            Err(_) => MediaType::Unknown,
        }
    }

    fn sys_device_attr(&self, kname: &str, attr: &str) -> String {
        fs::read_to_string(self.sys_block.join(kname).join("device").join(attr))
            .map(|value| value.trim().to_uppercase())
            .unwrap_or_default()
    }

    /// Heuristics to filter out QEMU/virtual devices.
    fn is_virtual(&self, kname: &str, id: &str) -> bool {
        let vendor = self.sys_device_attr(kname, "vendor");
        let model = self.sys_device_attr(kname, "model");
        if vendor.contains("QEMU")
            || model.contains("QEMU")
            || vendor.contains("VIRTUAL")
            || model.contains("VIRTUAL")
        {
            return true;
        }

        let base_id = Path::new(id)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        VIRTUAL_ID_PREFIXES
            .iter()
            .any(|prefix| base_id.starts_with(prefix))
    }

    /// Resolves a stable `/dev/disk/by-id/<id>` symlink for the device,
    /// preferring well-known prefixes, then the shortest name. Falls back
    /// to the raw device path when no by-id link points at it.
    fn persistent_id(&self, dev_path: &Path) -> String {
        let fallback = dev_path.to_string_lossy().into_owned();

        let Ok(real) = fs::canonicalize(dev_path) else {
            return fallback;
        };
        let Ok(entries) = fs::read_dir(&self.by_id_dir) else {
            return fallback;
        };

        let mut candidates: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                fs::canonicalize(entry.path())
                    .map(|target| target == real)
                    .unwrap_or(false)
            })
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        if candidates.is_empty() {
            return fallback;
        }

        candidates.sort_by_key(|name| {
            let preferred = PREFERRED_ID_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix));
            (usize::from(!preferred), name.len(), name.clone())
        });

        self.by_id_dir.join(&candidates[0]).display().to_string()
    }
}

impl DeviceSource for Discovery {
    fn discover(&self) -> Vec<Device> {
        self.enumerate()
    }
}
