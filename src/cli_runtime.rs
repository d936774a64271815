use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use fedspider::crawler::{CrawlLimits, Crawler};
use fedspider::parse;
use fedspider::rest::RestClient;
use fedspider::store::Store;

#[derive(Parser)]
#[command(name = "spider")]
#[command(about = "Crawl the fediverse public API into a social-graph checkpoint", long_about = None)]
pub(crate) struct Cli {
    /// JSON checkpoint to load (if present) and write back
    state_file: PathBuf,

    /// Seed instance origin or profile URL
    #[arg(default_value = "https://mastodon.social")]
    seed_url: String,

    /// Stop once this many new accounts have been learned
    #[arg(long, default_value_t = 100)]
    new_users: usize,

    /// Stop once this many new toots have been learned
    #[arg(long, default_value_t = 1000)]
    new_toots: usize,

    /// Hard bound on scheduler iterations
    #[arg(long, default_value_t = 100)]
    max_loops: u32,
}

pub(crate) fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fedspider=info,spider=info".into()),
        )
        .init();

    // Usage errors exit with code 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let store = if cli.state_file.exists() {
        Store::load(&cli.state_file)?
    } else {
        Store::new()
    };

    let mut crawler = Crawler::new(store, RestClient::new()?);
    learn_seed(&mut crawler.store, &cli.seed_url);

    let outcome = crawler.run(CrawlLimits {
        new_users: cli.new_users,
        new_toots: cli.new_toots,
        max_loops: cli.max_loops,
    });

    // Whatever happened, keep what was learned.
    if let Err(err) = crawler.store.save(&cli.state_file) {
        warn!(error = format!("{err:#}"), "could not save state");
    }
    outcome
}

/// Seeds may be a bare instance origin or a profile/actor URL; a profile
/// URL also teaches us the account.
fn learn_seed(store: &mut Store, seed_url: &str) {
    if let Some((instance_url, middle, _)) = parse::parse_profile_url(seed_url) {
        store.learn_instance(&instance_url);
        if middle.starts_with('@') {
            store.learn_account(&instance_url, &middle, "");
        }
        return;
    }
    store.learn_instance(seed_url.trim_end_matches('/'));
}
