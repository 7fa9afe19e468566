use anyhow::{Context, Result};
use async_trait::async_trait;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::FeedItem;
use crate::scraping::fragment_text;

/// Anything that can turn a feed URL into a parsed feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<Feed>;
}

/// Fetches feeds over HTTP with a bounded timeout.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_feed(&self, url: &str) -> Result<Feed> {
        let response = self.client.get(url).send().await.context("failed to fetch feed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;

        Ok(feed)
    }
}

/// Summary text, else content body, stripped of markup.
fn entry_hint(entry: &Entry) -> String {
    entry
        .summary
        .as_ref()
        .map(|s| fragment_text(&s.content))
        .filter(|s| !s.is_empty())
        .or_else(|| {
            entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_deref())
                .map(fragment_text)
        })
        .unwrap_or_default()
}

/// The entry's article link: first href whose `rel` is empty or `alternate`, else any href.
/// Atom entries often list `replies`, `edit` or `self` links before the article.
fn entry_link(entry: &Entry) -> String {
    let mut hrefs = entry
        .links
        .iter()
        .map(|l| (l.href.trim(), l.rel.as_deref().unwrap_or("")))
        .filter(|(href, _)| !href.is_empty());

    let fallback = hrefs.clone().next().map(|(href, _)| href);
    hrefs
        .find(|(_, rel)| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        .map(|(href, _)| href)
        .or(fallback)
        .unwrap_or_default()
        .to_string()
}

/// First `per_feed_cap` entries of `feed`, in feed order, minus those without a link or title.
pub fn feed_items(feed: &Feed, per_feed_cap: usize) -> Vec<FeedItem> {
    feed.entries
        .iter()
        .take(per_feed_cap)
        .filter_map(|entry| {
            let link = entry_link(entry);
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();

            if link.is_empty() || title.is_empty() {
                debug!("Skipping entry without link or title: {:?}", title);
                return None;
            }

            Some(FeedItem {
                title,
                link,
                summary_hint: entry_hint(entry),
            })
        })
        .collect()
}

/// Flatten per-feed batches in order; the first occurrence of a link wins.
pub fn dedup_in_order<I>(batches: I) -> Vec<FeedItem>
where
    I: IntoIterator<Item = Vec<FeedItem>>,
{
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.link.clone()))
        .collect()
}

/// Fetch every feed (up to `concurrency` at a time) and return the de-duplicated items in
/// declared feed order. A feed that fails to fetch or parse is logged and skipped.
pub async fn collect_feed_items(
    source: &dyn FeedSource,
    feed_urls: &[String],
    per_feed_cap: usize,
    concurrency: usize,
) -> Vec<FeedItem> {
    let batches: Vec<Vec<FeedItem>> = stream::iter(feed_urls)
        .map(|url| async move {
            match source.fetch_feed(url).await {
                Ok(feed) => {
                    let items = feed_items(&feed, per_feed_cap);
                    debug!(url = %url, entries = feed.entries.len(), kept = items.len(), "feed parsed");
                    items
                }
                Err(e) => {
                    warn!(url = %url, "skipping feed: {:#}", e);
                    Vec::new()
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    dedup_in_order(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, description)| {
                format!(
                    "<item><title>{}</title><link>{}</link><description>{}</description></item>",
                    title, link, description
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title><link>https://example.com</link><description>d</description>{}</channel></rss>"#,
            body
        )
    }

    fn parse(xml: &str) -> Feed {
        parser::parse(xml.as_bytes()).expect("parse test feed")
    }

    #[test]
    fn test_feed_items_reads_title_link_and_description() {
        let feed = parse(&rss(&[(
            "Goat elected mayor",
            "https://example.com/goat",
            "A goat won the vote.",
        )]));

        let items = feed_items(&feed, 25);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Goat elected mayor");
        assert_eq!(items[0].link, "https://example.com/goat");
        assert_eq!(items[0].summary_hint, "A goat won the vote.");
    }

    #[test]
    fn test_feed_items_skips_entries_without_title() {
        let feed = parse(&rss(&[
            ("", "https://example.com/untitled", "no title here"),
            ("Titled", "https://example.com/titled", ""),
        ]));

        let items = feed_items(&feed, 25);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://example.com/titled");
        assert_eq!(items[0].summary_hint, "");
    }

    #[test]
    fn test_per_feed_cap_applies_before_filtering() {
        let feed = parse(&rss(&[
            ("", "https://example.com/0", ""),
            ("One", "https://example.com/1", ""),
            ("Two", "https://example.com/2", ""),
        ]));

        let items = feed_items(&feed, 2);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "One");
    }

    #[test]
    fn test_atom_entry_uses_alternate_link() {
        let feed = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>tag:odd.blogspot.com,1999:blog-1</id>
  <title>Odd blog</title>
  <updated>2024-01-05T10:00:00Z</updated>
  <entry>
    <id>tag:odd.blogspot.com,1999:post-1</id>
    <title>Goat elected mayor</title>
    <updated>2024-01-05T10:00:00Z</updated>
    <summary>A goat won the vote.</summary>
    <link rel="replies" type="application/atom+xml" href="https://odd.blogspot.com/feeds/1/comments/default"/>
    <link rel="edit" type="application/atom+xml" href="https://www.blogger.com/feeds/1/posts/default/1"/>
    <link rel="self" type="application/atom+xml" href="https://www.blogger.com/feeds/1/posts/default/1"/>
    <link rel="alternate" type="text/html" href="https://odd.blogspot.com/2024/01/goat.html"/>
  </entry>
  <entry>
    <id>tag:odd.blogspot.com,1999:post-2</id>
    <title>Only a self link</title>
    <updated>2024-01-04T10:00:00Z</updated>
    <link rel="self" href="https://odd.blogspot.com/feeds/posts/2"/>
  </entry>
</feed>"#,
        );

        let items = feed_items(&feed, 25);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link, "https://odd.blogspot.com/2024/01/goat.html");
        assert_eq!(items[0].summary_hint, "A goat won the vote.");
        assert_eq!(items[1].link, "https://odd.blogspot.com/feeds/posts/2");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_and_order() {
        let a = vec![
            FeedItem::new("a1", "https://x.test/1", ""),
            FeedItem::new("a2", "https://x.test/2", ""),
            FeedItem::new("a1 again", "https://x.test/1", ""),
        ];
        let b = vec![
            FeedItem::new("b1", "https://x.test/2", "later copy"),
            FeedItem::new("b2", "https://y.test/3", ""),
        ];

        let merged = dedup_in_order(vec![a, b]);

        let titles: Vec<_> = merged.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "b2"]);
    }
}
