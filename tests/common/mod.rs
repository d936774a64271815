#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Value, json};

use fedspider::model::Toot;
use fedspider::parse;
use fedspider::rest::Gateway;

/// Canned-response gateway: a url → body table plus a log of every request
/// the crawler issued. Unknown urls answer like a dead server.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: HashMap<String, Value>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn requested(&self, url: &str) -> bool {
        self.requests.borrow().iter().any(|r| r == url)
    }
}

impl Gateway for ScriptedGateway {
    fn fetch(&self, url: &str) -> (bool, Value) {
        self.requests.borrow_mut().push(url.to_string());
        match self.responses.get(url) {
            Some(body) => (true, body.clone()),
            None => (false, json!({})),
        }
    }
}

/// A status object in the shape the public API returns, with the fields the
/// crawler reads.
pub fn status(uri: &str, acct: &str, acct_id: &str, id: &str) -> Value {
    json!({
        "uri": uri,
        "id": id,
        "replies_count": 0,
        "in_reply_to_id": null,
        "account": { "acct": acct, "id": acct_id },
    })
}

/// A freshly discovered toot record, the way the toot-list processor would
/// learn it.
pub fn bare_toot(uri: &str, acct: &str) -> Toot {
    let (_, toot_id) = parse::parse_toot_uri(uri).unwrap_or_default();
    Toot {
        uri: uri.to_string(),
        toot_id,
        acct: acct.to_string(),
        source_id: String::new(),
        local_instance: String::new(),
        local_id: String::new(),
        from_thread: false,
        favor: 0,
        related: 0,
    }
}
