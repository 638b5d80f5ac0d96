//! Cooldown tracker tests
//!
//! Tests for the per-device cooldown state machine.

use disk_status_exporter::scrape::cooldown::CooldownTracker;
use std::time::{Duration, Instant};

#[test]
fn test_unknown_device_is_eligible() {
    // Given: An empty tracker
    let tracker = CooldownTracker::new();

    // When: Checking a device that was never recorded
    // Then: It should be eligible
    assert!(tracker.is_eligible("wwn-0x5000c500a1b2c3d4", Instant::now()));
}

#[test]
fn test_timeout_installs_cooldown_window() {
    // Given: A tracker and a probe timeout at `now`
    let tracker = CooldownTracker::new();
    let now = Instant::now();
    let window = Duration::from_secs(300);

    // When: Recording the timeout
    tracker.record_timeout("wwn-B", now, window);

    // Then: The device is ineligible strictly inside the window
    assert!(!tracker.is_eligible("wwn-B", now));
    assert!(!tracker.is_eligible("wwn-B", now + window - Duration::from_millis(1)));

    // Then: Eligibility returns exactly at `now + window`
    assert!(tracker.is_eligible("wwn-B", now + window));
    assert!(tracker.is_eligible("wwn-B", now + window + Duration::from_secs(1)));
}

#[test]
fn test_timeout_refreshes_existing_cooldown() {
    // Given: A device already cooling down
    let tracker = CooldownTracker::new();
    let now = Instant::now();
    let window = Duration::from_secs(300);
    tracker.record_timeout("wwn-B", now, window);

    // When: A later timeout is recorded mid-window
    let later = now + Duration::from_secs(100);
    tracker.record_timeout("wwn-B", later, window);

    // Then: The window is unconditionally overwritten, not extended from
    // the first entry
    assert!(!tracker.is_eligible("wwn-B", now + window));
    assert!(tracker.is_eligible("wwn-B", later + window));
}

#[test]
fn test_success_clears_cooldown_early() {
    // Given: A device cooling down
    let tracker = CooldownTracker::new();
    let now = Instant::now();
    tracker.record_timeout("wwn-A", now, Duration::from_secs(300));
    assert!(!tracker.is_eligible("wwn-A", now));

    // When: A successful probe is recorded
    tracker.record_success("wwn-A", 0);

    // Then: The device is immediately eligible again
    assert!(tracker.is_eligible("wwn-A", now));
}

#[test]
fn test_success_never_extends_cooldown() {
    // Given: A device that is not cooling down
    let tracker = CooldownTracker::new();
    let now = Instant::now();

    // When: Recording successes
    tracker.record_success("wwn-A", 1);
    tracker.record_success("wwn-A", 2);

    // Then: The device stays eligible at any time
    assert!(tracker.is_eligible("wwn-A", now));
    assert!(tracker.is_eligible("wwn-A", now + Duration::from_secs(3600)));
}

#[test]
fn test_cooldowns_are_per_device() {
    // Given: Two devices, one timed out
    let tracker = CooldownTracker::new();
    let now = Instant::now();
    tracker.record_timeout("wwn-B", now, Duration::from_secs(300));

    // Then: Only the timed-out device is gated
    assert!(tracker.is_eligible("wwn-A", now));
    assert!(!tracker.is_eligible("wwn-B", now));
}

#[test]
fn test_last_known_state_tracks_successes() {
    // Given: An empty tracker
    let tracker = CooldownTracker::new();

    // Then: No state is known initially
    assert_eq!(tracker.last_known_state("wwn-A"), None);

    // When: Recording successive states
    tracker.record_success("wwn-A", 0);
    assert_eq!(tracker.last_known_state("wwn-A"), Some(0));

    tracker.record_success("wwn-A", 2);
    assert_eq!(tracker.last_known_state("wwn-A"), Some(2));
}

#[test]
fn test_last_known_state_survives_cooldown() {
    // Given: A device with a known state that later times out
    let tracker = CooldownTracker::new();
    let now = Instant::now();
    tracker.record_success("wwn-A", 1);

    // When: The device times out
    tracker.record_timeout("wwn-A", now, Duration::from_secs(300));

    // Then: The cached state is still available for reporting while the
    // device is skipped
    assert!(!tracker.is_eligible("wwn-A", now));
    assert_eq!(tracker.last_known_state("wwn-A"), Some(1));
}
