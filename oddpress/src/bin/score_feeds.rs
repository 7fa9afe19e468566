// Fetch feeds and print each collected item with its title-only weirdness score.
// Handy when tuning the source list: `score_feeds https://example.com/rss ...`
// With no arguments the feeds from config.default.toml / config.toml are used.

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::Path;

use oddpress::ingestion::{collect_feed_items, HttpFeedSource};
use oddpress::scoring::score_weirdness;

#[derive(Parser, Debug)]
#[command(name = "score_feeds", about = "Print collected feed items and their title/hint scores")]
struct Args {
    /// Feed URLs (defaults to the configured list)
    urls: Vec<String>,

    /// Entries read from each feed
    #[arg(long, default_value_t = common::DEFAULT_PER_FEED_CAP)]
    per_feed_cap: usize,

    /// Print items as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let urls = if args.urls.is_empty() {
        let config = Config::load_with_defaults(
            Some(Path::new("config.default.toml")),
            Some(Path::new("config.toml")),
        )
        .await?;
        config.resolve()?.pipeline.feed_urls
    } else {
        args.urls
    };

    let source = HttpFeedSource::new(common::DEFAULT_FETCH_TIMEOUT_SECS, common::DEFAULT_USER_AGENT)?;
    let items = collect_feed_items(&source, &urls, args.per_feed_cap.max(1), common::DEFAULT_FETCH_CONCURRENCY).await;

    println!("{} feeds, {} unique items", urls.len(), items.len());
    for item in &items {
        let body = if item.summary_hint.is_empty() { &item.title } else { &item.summary_hint };
        let score = score_weirdness(&item.title, body);
        if args.json {
            println!("{}", serde_json::json!({ "score": score, "item": item }));
        } else {
            println!("{:>3}  {}", score, item.title);
            println!("     {}", item.link);
        }
    }

    Ok(())
}
