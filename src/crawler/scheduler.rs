use std::time::Instant;

use anyhow::Result;
use rand::seq::IteratorRandom;
use tracing::{debug, info};

use super::{Crawler, CrawlLimits, ListContext};
use crate::rest::{self, Gateway};

/// How many queued toots one scheduler iteration works through. Toots
/// enqueued during a batch wait for the next one.
const TOOT_BATCH: usize = 100;

/// How many random picks to try before giving up on a sampling pass.
const SAMPLE_TRIES: usize = 10;

impl<G: Gateway> Crawler<G> {
    /// Drives discovery until both relative quotas are met or the loop
    /// budget runs out. Queued toots come first; an empty queue is reseeded
    /// from a random known account, or failing that from a random known
    /// instance's public timeline.
    pub fn run(&mut self, limits: CrawlLimits) -> Result<()> {
        let user_max = self.store.user_count() + limits.new_users;
        let toot_max = self.store.toot_count() + limits.new_toots;
        let mut nb_loops = 0;
        while (self.store.user_count() < user_max || self.store.toot_count() < toot_max)
            && nb_loops < limits.max_loops
        {
            nb_loops += 1;
            if self.store.todo_len() > 0 {
                info!(
                    pending = self.store.todo_len(),
                    batch = TOOT_BATCH,
                    "processing pending toots"
                );
                for uri in self.store.take_pending(TOOT_BATCH) {
                    self.process_pending_toot(&uri)?;
                }
            } else {
                let mut explored = false;
                if self.store.user_count() > 0 {
                    explored = self.process_random_account();
                }
                if !explored {
                    self.process_random_instance();
                }
            }
            info!(
                instances = self.store.instance_count(),
                users = self.store.user_count(),
                users_full = self.store.nb_user_full(),
                seen_by = self.store.nb_seen_by(),
                toots = self.store.toot_count(),
                pending = self.store.todo_len(),
                "crawl progress"
            );
        }
        Ok(())
    }

    /// Samples known accounts for one with a usable numeric id on a healthy
    /// host and pulls its recent statuses. Returns false when no pick
    /// qualified, letting the caller fall back to a public timeline.
    fn process_random_account(&mut self) -> bool {
        let now = Instant::now();
        for attempt in 0..SAMPLE_TRIES {
            let Some(key) = self.store.user_keys().choose(&mut self.rng).cloned() else {
                return false;
            };
            let Some(usr) = self.store.user(&key) else {
                return false;
            };
            if usr.acct_id.is_empty() || self.health.is_failing(&usr.instance_url, now) {
                continue;
            }
            let instance = usr.instance_url.clone();
            let acct = usr.acct.clone();
            let acct_id = usr.acct_id.clone();
            debug!(account = %key, attempts = attempt + 1, "picked account to explore");

            let (fetched, body) = self
                .gateway
                .fetch(&rest::account_statuses_url(&instance, &acct_id));
            if !fetched {
                self.health.just_failed(&instance, now);
                return true;
            }
            self.health.back_on(&instance);
            if let Some(entries) = body.as_array() {
                let ctx = ListContext {
                    local_instance: &instance,
                    observer_instance: &instance,
                    observer_acct: &acct,
                    from_thread: false,
                };
                self.process_toot_list(entries, &ctx);
            }
            return true;
        }
        debug!("no suitable account after {SAMPLE_TRIES} tries");
        false
    }

    /// Samples known instances for a healthy one and reads its public
    /// timeline with no observer credited.
    fn process_random_instance(&mut self) {
        let now = Instant::now();
        for _ in 0..SAMPLE_TRIES {
            let Some(instance) = self.store.instance_urls().choose(&mut self.rng).cloned() else {
                return;
            };
            if self.health.is_failing(&instance, now) {
                continue;
            }
            let (fetched, body) = self.gateway.fetch(&rest::public_timeline_url(&instance));
            if !fetched {
                self.health.just_failed(&instance, now);
                return;
            }
            self.health.back_on(&instance);
            if let Some(entries) = body.as_array() {
                let ctx = ListContext {
                    local_instance: &instance,
                    observer_instance: "",
                    observer_acct: "",
                    from_thread: false,
                };
                self.process_toot_list(entries, &ctx);
            }
            return;
        }
    }
}
