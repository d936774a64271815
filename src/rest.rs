use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

const USER_AGENT: &str = "fedspider";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const PAGE_LIMIT: u32 = 20;

/// The one operation the crawler needs from the network. [`RestClient`] is
/// the production implementation; tests substitute canned responses.
pub trait Gateway {
    /// GET `url` and decode the body as JSON. Returns `(false, {})` on any
    /// transport error, non-200 status, or decode failure; never an error.
    fn fetch(&self, url: &str) -> (bool, Value);
}

pub struct RestClient {
    http: reqwest::blocking::Client,
}

impl RestClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self { http })
    }
}

impl Gateway for RestClient {
    fn fetch(&self, url: &str) -> (bool, Value) {
        let empty = Value::Object(serde_json::Map::new());
        let resp = match self.http.get(url).send() {
            Ok(resp) => resp,
            Err(err) => {
                warn!(%url, error = %err, "request failed");
                return (false, empty);
            }
        };
        if resp.status() != reqwest::StatusCode::OK {
            warn!(%url, status = %resp.status(), "unexpected status");
            return (false, empty);
        }
        match resp.json::<Value>() {
            Ok(body) => {
                debug!(%url, "fetched");
                (true, body)
            }
            Err(err) => {
                warn!(%url, error = %err, "undecodable body");
                (false, empty)
            }
        }
    }
}

// Endpoint templates of the public API surface the crawler consumes.

pub fn public_timeline_url(instance: &str) -> String {
    format!("{instance}/api/v1/timelines/public?limit={PAGE_LIMIT}")
}

pub fn status_url(instance: &str, id: &str) -> String {
    format!("{instance}/api/v1/statuses/{id}")
}

pub fn context_url(instance: &str, id: &str) -> String {
    format!("{instance}/api/v1/statuses/{id}/context")
}

pub fn favourited_by_url(instance: &str, id: &str) -> String {
    format!("{instance}/api/v1/statuses/{id}/favourited_by")
}

pub fn account_statuses_url(instance: &str, acct_id: &str) -> String {
    format!("{instance}/api/v1/accounts/{acct_id}/statuses?limit={PAGE_LIMIT}")
}
