//! Per-device cooldown bookkeeping
//!
//! A device whose probe timed out is most likely spinning up; probing it
//! again immediately defeats the power saving this exporter measures. The
//! tracker is a coarse, time-based circuit breaker keyed by device id:
//! a timeout installs a cooldown window, eligibility is checked lazily,
//! and entries lapse on their own once the window passes.
//!
//! Shared by all in-flight probe tasks; every operation is a short map
//! access behind one mutex, never held across an await point.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Inner {
    cooldown_until: HashMap<String, Instant>,
    last_states: HashMap<String, i64>,
}

/// Records recent probe timeouts and gates probe eligibility.
#[derive(Default)]
pub struct CooldownTracker {
    inner: Mutex<Inner>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// False iff the device has an unexpired cooldown entry.
    pub fn is_eligible(&self, device_id: &str, now: Instant) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .cooldown_until
            .get(device_id)
            .map_or(true, |until| now >= *until)
    }

    /// Unconditionally installs or refreshes the cooldown window.
    pub fn record_timeout(&self, device_id: &str, now: Instant, cooldown: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .cooldown_until
            .insert(device_id.to_string(), now + cooldown);
    }

    /// Clears any pending cooldown early and caches the observed state.
    /// Never extends a cooldown.
    pub fn record_success(&self, device_id: &str, state_code: i64) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.cooldown_until.remove(device_id);
        inner.last_states.insert(device_id.to_string(), state_code);
    }

    /// Last state observed by a successful probe, used to report devices
    /// that are skipped while cooling down.
    pub fn last_known_state(&self, device_id: &str) -> Option<i64> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.last_states.get(device_id).copied()
    }
}
