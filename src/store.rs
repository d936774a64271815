use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::model::{Account, AccountDoc, StateDoc, Toot, TootDoc, account_key};
use crate::parse;

/// In-memory crawl state: every instance, account and toot learned so far,
/// plus the queue of toots still to be explored. The crawler owns exactly
/// one store; entities never leave it, callers address them by key.
///
/// Map iteration order is deterministic (`BTreeMap`/`BTreeSet`) so that
/// checkpoints serialize stably and seeded random sampling is reproducible.
#[derive(Debug, Default)]
pub struct Store {
    instances: BTreeSet<String>,
    users: BTreeMap<String, Account>,
    toots: BTreeMap<String, Toot>,
    toot_todo: VecDeque<String>,
    nb_user_full: u64,
    nb_seen_by: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn toot_count(&self) -> usize {
        self.toots.len()
    }

    pub fn todo_len(&self) -> usize {
        self.toot_todo.len()
    }

    /// Count of users whose numeric id is known.
    pub fn nb_user_full(&self) -> u64 {
        self.nb_user_full
    }

    /// Total observation edges across all users.
    pub fn nb_seen_by(&self) -> u64 {
        self.nb_seen_by
    }

    pub fn contains_instance(&self, instance_url: &str) -> bool {
        self.instances.contains(instance_url)
    }

    pub fn instance_urls(&self) -> impl Iterator<Item = &String> {
        self.instances.iter()
    }

    pub fn user(&self, key: &str) -> Option<&Account> {
        self.users.get(key)
    }

    pub fn users(&self) -> impl Iterator<Item = &Account> {
        self.users.values()
    }

    pub fn user_keys(&self) -> impl Iterator<Item = &String> {
        self.users.keys()
    }

    pub fn toot(&self, uri: &str) -> Option<&Toot> {
        self.toots.get(uri)
    }

    pub fn toots(&self) -> impl Iterator<Item = &Toot> {
        self.toots.values()
    }

    pub fn pending(&self) -> impl Iterator<Item = &String> {
        self.toot_todo.iter()
    }

    /// Takes up to `max` URIs off the front of the pending queue.
    pub fn take_pending(&mut self, max: usize) -> Vec<String> {
        let n = self.toot_todo.len().min(max);
        self.toot_todo.drain(..n).collect()
    }

    pub fn learn_instance(&mut self, instance_url: &str) {
        self.instances.insert(instance_url.to_string());
    }

    /// Idempotent account insert. A known account keeps its first non-empty
    /// numeric id; filling an empty one bumps the full-user counter.
    pub fn learn_account(&mut self, instance_url: &str, acct: &str, acct_id: &str) -> &Account {
        self.instances.insert(instance_url.to_string());
        let usr = self
            .users
            .entry(account_key(instance_url, acct))
            .or_insert_with(|| Account::new(instance_url, acct));
        if usr.acct_id.is_empty() && !acct_id.is_empty() {
            usr.acct_id = acct_id.to_string();
            self.nb_user_full += 1;
        }
        usr
    }

    /// Records that `seen_by_acct` was observed interacting with `acct`.
    /// Self-edges are suppressed.
    pub fn learn_seen_by(
        &mut self,
        instance_url: &str,
        acct: &str,
        seen_by_instance: &str,
        seen_by_acct: &str,
    ) {
        let observer = account_key(seen_by_instance, seen_by_acct);
        self.instances.insert(instance_url.to_string());
        let usr = self
            .users
            .entry(account_key(instance_url, acct))
            .or_insert_with(|| Account::new(instance_url, acct));
        if usr.add_seen_by(&observer) {
            self.nb_seen_by += 1;
        }
    }

    /// Records a toot if it is new, queueing it for exploration exactly
    /// once. Re-learning an existing toot can only add information: the
    /// thread flag flips to true and an empty first-observation view fills
    /// in.
    pub fn learn_toot(&mut self, toot: Toot) {
        if let Some(existing) = self.toots.get_mut(&toot.uri) {
            if toot.from_thread {
                existing.from_thread = true;
            }
            if existing.local_instance.is_empty() && !toot.local_instance.is_empty() {
                existing.local_instance = toot.local_instance;
                existing.local_id = toot.local_id;
            }
            return;
        }
        if let Some((home, _)) = parse::parse_toot_uri(&toot.uri) {
            self.instances.insert(home);
        }
        self.toot_todo.push_back(toot.uri.clone());
        self.toots.insert(toot.uri.clone(), toot);
    }

    /// Fills a toot's home-instance numeric id once known.
    pub fn record_toot_source(&mut self, uri: &str, source_id: &str) {
        if let Some(toot) = self.toots.get_mut(uri)
            && toot.source_id.is_empty()
            && !source_id.is_empty()
        {
            toot.source_id = source_id.to_string();
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.to_doc()).context("serialize state")?;
        write_atomic(path, &bytes)
            .with_context(|| format!("write state file {}", path.display()))?;
        Ok(())
    }

    /// Loads a checkpoint. Missing top-level keys are tolerated; a document
    /// that yields no instances at all is structurally invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("read state file {}", path.display()))?;
        let doc: StateDoc = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse state file {}", path.display()))?;
        let store = Self::from_doc(doc);
        if store.instances.is_empty() {
            return Err(anyhow!("state file {} has no instances", path.display()));
        }
        info!(
            instances = store.instance_count(),
            users = store.user_count(),
            users_full = store.nb_user_full(),
            seen_by = store.nb_seen_by(),
            toots = store.toot_count(),
            pending = store.todo_len(),
            "loaded state"
        );
        Ok(store)
    }

    fn to_doc(&self) -> StateDoc {
        StateDoc {
            instances: self.instances.iter().cloned().collect(),
            users: self
                .users
                .values()
                .map(|u| AccountDoc {
                    instance: u.instance_url.clone(),
                    acct: u.acct.clone(),
                    acct_id: u.acct_id.clone(),
                    seen_by: u.seen_by.iter().cloned().collect(),
                })
                .collect(),
            toots: self
                .toots
                .values()
                .map(|t| TootDoc {
                    uri: t.uri.clone(),
                    acct: t.acct.clone(),
                    toot_id: t.toot_id.clone(),
                    source_id: t.source_id.clone(),
                    local_instance: t.local_instance.clone(),
                    local_id: t.local_id.clone(),
                    from_thread: t.from_thread,
                    favor: t.favor,
                    related: t.related,
                })
                .collect(),
            toots_todo: self.toot_todo.iter().cloned().collect(),
        }
    }

    /// Rebuilds the in-memory state from a parsed document. The derived
    /// counters are recomputed, and the instance table is re-closed over
    /// every user and toot home so the store invariants hold even for
    /// hand-edited files.
    fn from_doc(doc: StateDoc) -> Self {
        let mut store = Store::default();
        for instance_url in doc.instances {
            store.instances.insert(instance_url);
        }
        for usr in doc.users {
            store.instances.insert(usr.instance.clone());
            let mut account = Account::new(&usr.instance, &usr.acct);
            account.acct_id = usr.acct_id;
            for key in usr.seen_by {
                if account.add_seen_by(&key) {
                    store.nb_seen_by += 1;
                }
            }
            if !account.acct_id.is_empty() {
                store.nb_user_full += 1;
            }
            store.users.insert(account.key(), account);
        }
        for toot in doc.toots {
            if let Some((home, _)) = parse::parse_toot_uri(&toot.uri) {
                store.instances.insert(home);
            }
            let record = Toot {
                uri: toot.uri,
                toot_id: toot.toot_id,
                acct: toot.acct,
                source_id: toot.source_id,
                local_instance: toot.local_instance,
                local_id: toot.local_id,
                from_thread: toot.from_thread,
                favor: toot.favor,
                related: toot.related,
            };
            store.toots.insert(record.uri.clone(), record);
        }
        store.toot_todo = doc.toots_todo.into();
        store
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
