use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

const BACKOFF_STEP: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct HostHealth {
    failures: u32,
    try_after: Option<Instant>,
    got_back_on: bool,
}

/// Per-instance failure tracking. A host that keeps failing is retried with
/// a linearly growing delay, 30 s per consecutive failure, unbounded until a
/// success resets it. Nothing here is persisted; a fresh run gives every
/// host a clean slate.
#[derive(Debug, Default)]
pub struct HealthTracker {
    hosts: HashMap<String, HostHealth>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while `instance` is inside its backoff window.
    pub fn is_failing(&self, instance: &str, now: Instant) -> bool {
        self.hosts
            .get(instance)
            .and_then(|h| h.try_after)
            .is_some_and(|t| now < t)
    }

    pub fn just_failed(&mut self, instance: &str, now: Instant) {
        let host = self.hosts.entry(instance.to_string()).or_default();
        host.failures += 1;
        host.try_after = Some(now + BACKOFF_STEP * host.failures);
    }

    /// Records a successful fetch, clearing any backoff state. Logs the
    /// recovery once per outage.
    pub fn back_on(&mut self, instance: &str) {
        if let Some(host) = self.hosts.get_mut(instance)
            && host.failures > 0
        {
            info!(%instance, failures = host.failures, "instance back on");
            host.failures = 0;
            host.try_after = None;
            host.got_back_on = true;
        }
    }

    pub fn failures(&self, instance: &str) -> u32 {
        self.hosts.get(instance).map_or(0, |h| h.failures)
    }
}
