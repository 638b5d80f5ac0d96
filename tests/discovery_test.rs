//! Device discovery tests
//!
//! Exercises the sysfs-backed discovery against temporary fixture trees
//! mimicking /sys/block, /dev, and /dev/disk/by-id.

#![cfg(unix)]

use disk_status_exporter::scrape::discovery::{DeviceSource, Discovery, MediaType};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builds a fake /sys/block + /dev + by-id layout inside a tempdir.
struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().expect("Failed to create tempdir");
        fs::create_dir_all(root.path().join("sys/block")).unwrap();
        fs::create_dir_all(root.path().join("dev/disk/by-id")).unwrap();
        Self { root }
    }

    fn sys_block(&self) -> PathBuf {
        self.root.path().join("sys/block")
    }

    fn dev_dir(&self) -> PathBuf {
        self.root.path().join("dev")
    }

    fn by_id_dir(&self) -> PathBuf {
        self.root.path().join("dev/disk/by-id")
    }

    /// Adds a block device: sysfs entry, optional rotational flag and
    /// vendor/model attributes, plus the /dev node.
    fn add_device(
        &self,
        kname: &str,
        rotational: Option<&str>,
        vendor: Option<&str>,
        model: Option<&str>,
    ) {
        let sys = self.sys_block().join(kname);
        fs::create_dir_all(sys.join("queue")).unwrap();
        fs::create_dir_all(sys.join("device")).unwrap();
        if let Some(rot) = rotational {
            fs::write(sys.join("queue/rotational"), format!("{}\n", rot)).unwrap();
        }
        if let Some(vendor) = vendor {
            fs::write(sys.join("device/vendor"), format!("{}\n", vendor)).unwrap();
        }
        if let Some(model) = model {
            fs::write(sys.join("device/model"), format!("{}\n", model)).unwrap();
        }
        fs::write(self.dev_dir().join(kname), b"").unwrap();
    }

    fn add_by_id(&self, link_name: &str, kname: &str) {
        symlink(self.dev_dir().join(kname), self.by_id_dir().join(link_name)).unwrap();
    }

    fn discovery(&self) -> Discovery {
        Discovery::with_roots(self.sys_block(), self.dev_dir(), self.by_id_dir())
    }
}

#[test]
fn test_virtual_and_pseudo_knames_are_skipped() {
    // Given: Pseudo devices alongside one real disk
    let fixture = Fixture::new();
    fixture.add_device("sda", Some("1"), None, None);
    fixture.add_device("loop0", Some("0"), None, None);
    fixture.add_device("ram1", Some("0"), None, None);
    fixture.add_device("fd0", Some("1"), None, None);
    fixture.add_device("sr0", Some("1"), None, None);
    fixture.add_device("dm-0", Some("0"), None, None);

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: Only the real disk remains
    assert_eq!(devices.len(), 1);
    assert!(devices[0].dev_path.ends_with("/sda"));
}

#[test]
fn test_rotational_flag_classifies_media_type() {
    // Given: A rotational disk, a solid-state disk, and one with no flag
    let fixture = Fixture::new();
    fixture.add_device("sda", Some("1"), None, None);
    fixture.add_device("sdb", Some("0"), None, None);
    fixture.add_device("sdc", None, None, None);

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: hdd / ssd / unknown respectively (kname order)
    assert_eq!(devices.len(), 3);
    assert_eq!(devices[0].media_type, MediaType::Hdd);
    assert_eq!(devices[1].media_type, MediaType::Ssd);
    assert_eq!(devices[2].media_type, MediaType::Unknown);
}

#[test]
fn test_qemu_vendor_marks_device_virtual() {
    // Given: A rotational disk reporting a QEMU vendor string
    let fixture = Fixture::new();
    fixture.add_device("sda", Some("1"), Some("QEMU"), Some("QEMU HARDDISK"));

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: Classified virtual despite rotational==1
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].media_type, MediaType::Virtual);
}

#[test]
fn test_virtio_by_id_prefix_marks_device_virtual() {
    // Given: A disk with no vendor/model attributes but a virtio by-id link
    let fixture = Fixture::new();
    fixture.add_device("vda", Some("1"), None, None);
    fixture.add_by_id("virtio-abc123", "vda");

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: Classified virtual from the link name
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].media_type, MediaType::Virtual);
}

#[test]
fn test_persistent_id_prefers_wellknown_prefixes() {
    // Given: Several by-id links pointing at the same disk
    let fixture = Fixture::new();
    fixture.add_device("sda", Some("1"), None, None);
    fixture.add_by_id("nonpreferred-serial-123", "sda");
    fixture.add_by_id("wwn-0x5000c500a1b2c3d4", "sda");
    fixture.add_by_id("ata-WDC_WD40EFRX-ABC", "sda");

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: A preferred-prefix link wins, shortest first
    assert_eq!(devices.len(), 1);
    assert!(
        devices[0].id.ends_with("/ata-WDC_WD40EFRX-ABC"),
        "unexpected id: {}",
        devices[0].id
    );
}

#[test]
fn test_persistent_id_falls_back_to_dev_path() {
    // Given: A disk with no by-id link at all
    let fixture = Fixture::new();
    fixture.add_device("sda", Some("1"), None, None);

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: The raw /dev path is used as the identifier
    assert_eq!(devices[0].id, devices[0].dev_path);
}

#[test]
fn test_missing_sysfs_tree_degrades_to_empty_list() {
    // Given: Discovery rooted at a path that does not exist
    let fixture = Fixture::new();
    let discovery = Discovery::with_roots(
        fixture.root.path().join("nonexistent"),
        fixture.dev_dir(),
        fixture.by_id_dir(),
    );

    // When: Discovering
    let devices = discovery.discover();

    // Then: Empty list, no panic - the scrape still succeeds upstream
    assert!(devices.is_empty());
}

#[test]
fn test_device_without_dev_node_is_skipped() {
    // Given: A sysfs entry whose /dev node is missing
    let fixture = Fixture::new();
    fixture.add_device("sda", Some("1"), None, None);
    let sys = fixture.sys_block().join("sdb");
    fs::create_dir_all(sys.join("queue")).unwrap();
    fs::write(sys.join("queue/rotational"), "1\n").unwrap();

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: Only the device with a node is reported
    assert_eq!(devices.len(), 1);
    assert!(devices[0].dev_path.ends_with("/sda"));
}

#[test]
fn test_devices_are_enumerated_in_kname_order() {
    // Given: Devices created out of order
    let fixture = Fixture::new();
    fixture.add_device("sdc", Some("1"), None, None);
    fixture.add_device("sda", Some("1"), None, None);
    fixture.add_device("sdb", Some("1"), None, None);

    // When: Discovering
    let devices = fixture.discovery().discover();

    // Then: Stable kname ordering
    let paths: Vec<&str> = devices
        .iter()
        .map(|device| device.dev_path.as_str())
        .collect();
    assert!(paths[0].ends_with("/sda"));
    assert!(paths[1].ends_with("/sdb"));
    assert!(paths[2].ends_with("/sdc"));
}
