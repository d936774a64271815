use std::collections::BTreeSet;

/// One account as observed from one instance.
///
/// The same human identity seen from two instances is two records:
/// cross-instance identity is non-authoritative in the federation, so the
/// store never merges them.
#[derive(Clone, Debug)]
pub struct Account {
    pub instance_url: String,

    /// Handle in home-relative form, e.g. `@alice`.
    pub acct: String,

    /// Numeric id at the home instance. Empty until a status fetched from
    /// the home instance reveals it.
    pub acct_id: String,

    /// Keys of accounts observed boosting, favouriting, replying to or
    /// threading with this one. Never contains this account's own key.
    pub seen_by: BTreeSet<String>,
}

impl Account {
    pub fn new(instance_url: &str, acct: &str) -> Self {
        Self {
            instance_url: instance_url.to_string(),
            acct: acct.to_string(),
            acct_id: String::new(),
            seen_by: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> String {
        account_key(&self.instance_url, &self.acct)
    }

    /// Records an observer, refusing self-edges. Returns whether the key
    /// was new.
    pub fn add_seen_by(&mut self, observer_key: &str) -> bool {
        if observer_key == self.key() {
            return false;
        }
        self.seen_by.insert(observer_key.to_string())
    }
}

/// Lookup key of an account: `instance_url + "/" + acct`.
pub fn account_key(instance_url: &str, acct: &str) -> String {
    format!("{instance_url}/{acct}")
}
