mod pending;
mod scheduler;
mod toot_list;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::health::HealthTracker;
use crate::rest::Gateway;
use crate::store::Store;

/// Crawl quotas. The user and toot targets are relative to the state the
/// crawler starts from; the loop budget bounds a run regardless of
/// progress.
#[derive(Clone, Copy, Debug)]
pub struct CrawlLimits {
    pub new_users: usize,
    pub new_toots: usize,
    pub max_loops: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            new_users: 100,
            new_toots: 1000,
            max_loops: 100,
        }
    }
}

/// The crawler engine: one store, one gateway, one host-health tracker, one
/// RNG. Strictly sequential; every fetch completes (parse, learn, enqueue)
/// before the next one starts.
pub struct Crawler<G> {
    pub store: Store,
    pub health: HealthTracker,
    gateway: G,
    rng: StdRng,
}

impl<G: Gateway> Crawler<G> {
    pub fn new(store: Store, gateway: G) -> Self {
        Self {
            store,
            health: HealthTracker::new(),
            gateway,
            rng: StdRng::from_entropy(),
        }
    }

    /// Same crawler with a fixed RNG seed, so account and instance sampling
    /// is reproducible.
    pub fn with_seed(store: Store, gateway: G, seed: u64) -> Self {
        Self {
            store,
            health: HealthTracker::new(),
            gateway,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn into_store(self) -> Store {
        self.store
    }
}

/// Where a list of statuses came from: the instance that served it, the
/// account (if any) on whose behalf we read it, and whether the list is
/// part of a thread context. An empty observer means nobody gets credited
/// with having seen these toots.
pub(crate) struct ListContext<'a> {
    pub local_instance: &'a str,
    pub observer_instance: &'a str,
    pub observer_acct: &'a str,
    pub from_thread: bool,
}

impl ListContext<'_> {
    pub(crate) fn has_observer(&self) -> bool {
        !self.observer_instance.is_empty() && !self.observer_acct.is_empty()
    }
}
