mod common;

use anyhow::{Context, Result};
use serde_json::json;

use fedspider::crawler::{CrawlLimits, Crawler};
use fedspider::parse;
use fedspider::rest;
use fedspider::store::Store;

use common::{ScriptedGateway, status};

const A: &str = "https://a.example";
const B: &str = "https://b.example";
const S1: &str = "https://a.example/users/alice/statuses/1";
const S2: &str = "https://b.example/users/bob/statuses/42";
const SEED: u64 = 5;

/// Every response the two-iteration crawl can ask for.
fn scripted() -> ScriptedGateway {
    ScriptedGateway::new()
        .on(
            &rest::public_timeline_url(A),
            json!([
                status(S1, "alice", "11", "1"),
                status(S2, "bob@b.example", "99", "9042"),
            ]),
        )
        .on(&rest::status_url(A, "1"), status(S1, "alice", "11", "1"))
        .on(&rest::status_url(B, "42"), status(S2, "bob", "99", "42"))
        .on(&rest::favourited_by_url(A, "1"), json!([]))
        .on(&rest::favourited_by_url(B, "42"), json!([]))
}

fn limits(max_loops: u32) -> CrawlLimits {
    CrawlLimits {
        new_users: 5,
        new_toots: 5,
        max_loops,
    }
}

fn assert_invariants(store: &Store) {
    let mut seen_by_total = 0;
    let mut full_total = 0;
    for usr in store.users() {
        assert!(!usr.seen_by.contains(&usr.key()), "self edge on {}", usr.key());
        assert!(store.contains_instance(&usr.instance_url));
        seen_by_total += usr.seen_by.len() as u64;
        if !usr.acct_id.is_empty() {
            full_total += 1;
        }
    }
    for toot in store.toots() {
        assert!(toot.uri.starts_with("https://"));
        let (home, last) = parse::parse_toot_uri(&toot.uri).expect("parsable toot uri");
        assert_eq!(toot.toot_id, last);
        assert!(store.contains_instance(&home));
    }
    assert_eq!(store.nb_seen_by(), seen_by_total);
    assert_eq!(store.nb_user_full(), full_total);
}

#[test]
fn interrupted_and_uninterrupted_runs_fetch_the_same_things() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let path = tmp.path().join("state.json");

    // First leg: discover the timeline, then checkpoint.
    let mut store = Store::new();
    store.learn_instance(A);
    let mut first = Crawler::with_seed(store, scripted(), SEED);
    first.run(limits(1))?;
    first.store.save(&path)?;
    let first_requests = first.gateway().requests();

    // Second leg: reload and keep going.
    let loaded = Store::load(&path)?;
    assert_invariants(&loaded);
    assert_eq!(loaded.todo_len(), first.store.todo_len());

    let mut second = Crawler::with_seed(loaded, scripted(), SEED);
    second.run(limits(1))?;
    let second_requests = second.gateway().requests();

    // Control: the same crawl without the checkpoint in the middle.
    let mut store = Store::new();
    store.learn_instance(A);
    let mut control = Crawler::with_seed(store, scripted(), SEED);
    control.run(limits(2))?;

    let mut resumed = first_requests;
    resumed.extend(second_requests);
    assert_eq!(control.gateway().requests(), resumed);

    assert_invariants(&second.store);
    assert_invariants(&control.store);
    assert_eq!(control.store.user_count(), second.store.user_count());
    assert_eq!(control.store.toot_count(), second.store.toot_count());
    assert_eq!(control.store.nb_seen_by(), second.store.nb_seen_by());
    Ok(())
}

#[test]
fn quotas_stop_the_loop_once_both_are_met() -> Result<()> {
    let mut store = Store::new();
    store.learn_instance(A);
    let mut crawler = Crawler::with_seed(
        store,
        scripted(),
        SEED,
    );
    // Quotas of zero are already met; the loop must not run at all.
    crawler.run(CrawlLimits {
        new_users: 0,
        new_toots: 0,
        max_loops: 100,
    })?;
    assert!(crawler.gateway().requests().is_empty());
    Ok(())
}

#[test]
fn loop_budget_caps_a_run_that_cannot_meet_quota() -> Result<()> {
    // Nothing is scripted: every instance pick fails, forever.
    let mut store = Store::new();
    store.learn_instance(A);
    let mut crawler = Crawler::with_seed(store, ScriptedGateway::new(), SEED);
    crawler.run(CrawlLimits {
        new_users: 10,
        new_toots: 10,
        max_loops: 3,
    })?;
    // One timeline attempt per loop at most, then the budget ends the run.
    assert!(crawler.gateway().requests().len() <= 3);
    Ok(())
}
