use serde_json::Value;
use tracing::debug;

use super::{Crawler, ListContext};
use crate::model::Toot;
use crate::parse;
use crate::rest::Gateway;

/// The origin account of a status, as recorded in the store.
pub(crate) struct Origin {
    pub instance_url: String,
    pub acct: String,
    pub acct_id: String,
}

impl<G: Gateway> Crawler<G> {
    /// Interprets one page of status objects. Entries without a usable
    /// ActivityPub uri or account are dropped.
    pub(crate) fn process_toot_list(&mut self, entries: &[Value], ctx: &ListContext<'_>) {
        for entry in entries {
            self.process_toot_entry(entry, ctx);
        }
    }

    pub(crate) fn process_toot_entry(&mut self, entry: &Value, ctx: &ListContext<'_>) {
        let Some(uri) = entry.get("uri").and_then(Value::as_str) else {
            return;
        };
        let Some((_, toot_id)) = parse::parse_toot_uri(uri) else {
            debug!(%uri, "discarding entry with unusable uri");
            return;
        };
        let Some(origin) = self.find_toot_origin(entry, ctx.local_instance) else {
            debug!(%uri, "cannot find origin for toot");
            return;
        };

        if toot_id == "activity" {
            // Reblog wrapper: the interesting toot is nested one level down,
            // and the wrapper's author is the booster.
            let Some(reblog) = entry.get("reblog") else {
                return;
            };
            if ctx.has_observer() {
                self.store.learn_seen_by(
                    &origin.instance_url,
                    &origin.acct,
                    ctx.observer_instance,
                    ctx.observer_acct,
                );
            }
            let nested = ListContext {
                local_instance: ctx.local_instance,
                observer_instance: &origin.instance_url,
                observer_acct: &origin.acct,
                from_thread: false,
            };
            self.process_toot_entry(reblog, &nested);
            return;
        }

        let local_id = entry
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let favor = count_field(entry, "favourited");
        let mut related = count_field(entry, "replies_count");
        if related == 0 && entry.get("in_reply_to_id").is_some_and(|v| !v.is_null()) {
            related = 1;
        }
        self.store.learn_toot(Toot {
            uri: uri.to_string(),
            toot_id,
            acct: origin.acct.clone(),
            source_id: String::new(),
            local_instance: ctx.local_instance.to_string(),
            local_id,
            from_thread: ctx.from_thread,
            favor,
            related,
        });
        if ctx.has_observer() {
            self.store.learn_seen_by(
                &origin.instance_url,
                &origin.acct,
                ctx.observer_instance,
                ctx.observer_acct,
            );
        }
    }

    /// Learns the account a status entry's `account` object describes and
    /// returns it.
    pub(crate) fn find_toot_origin(
        &mut self,
        entry: &Value,
        local_instance: &str,
    ) -> Option<Origin> {
        self.learn_account_entry(entry.get("account")?, local_instance)
    }

    /// Learns an account object as served by `local_instance`. The numeric
    /// account id is adopted only when the account's home is the serving
    /// instance; other instances assign their own, meaningless ids.
    pub(crate) fn learn_account_entry(
        &mut self,
        account: &Value,
        local_instance: &str,
    ) -> Option<Origin> {
        let acct_field = account.get("acct").and_then(Value::as_str)?;
        let (acct, host) = parse::split_acct(acct_field);
        let instance_url = match host {
            Some(host) => parse::origin(&host),
            None => local_instance.to_string(),
        };
        let acct_id = if instance_url == local_instance {
            account.get("id").and_then(Value::as_str).unwrap_or_default()
        } else {
            ""
        };
        let usr = self.store.learn_account(&instance_url, &acct, acct_id);
        Some(Origin {
            instance_url: usr.instance_url.clone(),
            acct: usr.acct.clone(),
            acct_id: usr.acct_id.clone(),
        })
    }
}

/// Counters arrive as JSON numbers from Mastodon; some servers stringify
/// them.
fn count_field(entry: &Value, key: &str) -> u32 {
    match entry.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as u32,
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
