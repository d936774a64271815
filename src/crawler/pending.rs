use std::time::Instant;

use anyhow::{Result, bail};
use serde_json::Value;
use tracing::debug;

use super::{Crawler, ListContext};
use crate::model::{Toot, account_key};
use crate::parse;
use crate::rest::{self, Gateway};

impl<G: Gateway> Crawler<G> {
    /// Works one queued toot: resolve its home copy, then attribute
    /// favourites and thread neighbours. A toot whose home is backing off
    /// is skipped and not re-enqueued; it stays in the store and is only
    /// revisited if rediscovered.
    pub(crate) fn process_pending_toot(&mut self, uri: &str) -> Result<()> {
        let Some(toot) = self.store.toot(uri) else {
            bail!("queued toot {uri} is not in the store");
        };
        let toot = toot.clone();
        let Some((home, _)) = parse::parse_toot_uri(uri) else {
            bail!("queued toot {uri} has an unparsable uri");
        };
        let now = Instant::now();
        if self.health.is_failing(&home, now) {
            debug!(uri, %home, "home instance backing off, skipping toot");
            return Ok(());
        }

        let mut ok = false;
        if !parse::is_all_digits(&toot.toot_id) {
            // Pleroma-style flake id: the status endpoints require auth on
            // those servers, so fail fast without a request.
            debug!(uri, "non-numeric status id, skipping direct fetch");
        } else if toot.source_id.is_empty()
            || self.store.user(&account_key(&home, &toot.acct)).is_none()
        {
            let (fetched, body) = self.gateway.fetch(&rest::status_url(&home, &toot.toot_id));
            if fetched {
                self.health.back_on(&home);
                if let Some(origin) = self.find_toot_origin(&body, &home) {
                    self.store.record_toot_source(uri, &origin.acct_id);
                    ok = true;
                } else {
                    debug!(uri, "status carries no usable account");
                }
            } else {
                self.health.just_failed(&home, now);
            }
        } else {
            // Origin already known; nothing to resolve.
            ok = true;
        }

        // A copy cached by the instance we first saw the toot on can stand
        // in when the home copy is unavailable.
        let has_fallback = !toot.local_instance.is_empty()
            && toot.local_instance != home
            && !toot.local_id.is_empty();
        let mut use_instance = home.clone();
        let mut use_id = toot.toot_id.clone();
        if !ok && has_fallback {
            use_instance = toot.local_instance.clone();
            use_id = toot.local_id.clone();
            ok = true;
        }
        if !ok {
            return Ok(());
        }

        if toot.favor == 0 {
            self.fetch_favourites(&toot, &home, &mut use_instance, &mut use_id, has_fallback);
        }
        if toot.related > 0 && !toot.from_thread {
            self.fetch_context(&toot, &home, &use_instance, &use_id);
        }
        Ok(())
    }

    /// Pulls the favouriter list and credits each favouriter with having
    /// seen the toot's author. A failure at the home instance retries once
    /// against the cached view, switching the rest of the processing over
    /// to it.
    fn fetch_favourites(
        &mut self,
        toot: &Toot,
        home: &str,
        use_instance: &mut String,
        use_id: &mut String,
        has_fallback: bool,
    ) {
        let now = Instant::now();
        let (fetched, body) = self
            .gateway
            .fetch(&rest::favourited_by_url(use_instance, use_id));
        let body = if fetched {
            self.health.back_on(use_instance);
            body
        } else {
            self.health.just_failed(use_instance, now);
            if use_instance.as_str() != home || !has_fallback {
                return;
            }
            *use_instance = toot.local_instance.clone();
            *use_id = toot.local_id.clone();
            let (retried, body) = self
                .gateway
                .fetch(&rest::favourited_by_url(use_instance, use_id));
            if !retried {
                self.health.just_failed(use_instance, Instant::now());
                return;
            }
            self.health.back_on(use_instance);
            body
        };

        let Some(accounts) = body.as_array() else {
            return;
        };
        for account in accounts {
            if let Some(favoriter) = self.learn_account_entry(account, use_instance) {
                self.store.learn_seen_by(
                    home,
                    &toot.acct,
                    &favoriter.instance_url,
                    &favoriter.acct,
                );
            }
        }
    }

    /// Pulls the thread around the toot. The first ancestor is the thread's
    /// original poster, observed by the current toot's author; everyone
    /// else in the thread is observed by the original poster. Without
    /// ancestors the current toot opened the thread itself.
    fn fetch_context(&mut self, toot: &Toot, home: &str, instance: &str, id: &str) {
        let now = Instant::now();
        let (fetched, body) = self.gateway.fetch(&rest::context_url(instance, id));
        if !fetched {
            self.health.just_failed(instance, now);
            return;
        }
        self.health.back_on(instance);

        let ancestors = body
            .get("ancestors")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let descendants = body
            .get("descendants")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut op_instance = home.to_string();
        let mut op_acct = toot.acct.clone();
        if let Some(first) = ancestors.first() {
            let ctx = ListContext {
                local_instance: instance,
                observer_instance: home,
                observer_acct: &toot.acct,
                from_thread: true,
            };
            self.process_toot_entry(first, &ctx);
            if let Some(op) = self.find_toot_origin(first, instance) {
                op_instance = op.instance_url;
                op_acct = op.acct;
            }
        }

        let rest_of_thread = if ancestors.is_empty() {
            &ancestors[..]
        } else {
            &ancestors[1..]
        };
        let ctx = ListContext {
            local_instance: instance,
            observer_instance: &op_instance,
            observer_acct: &op_acct,
            from_thread: true,
        };
        self.process_toot_list(rest_of_thread, &ctx);
        self.process_toot_list(&descendants, &ctx);
    }
}
