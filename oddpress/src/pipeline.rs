//! One batch run: collect, fetch, score, select, summarize, render.
//!
//! Each stage degrades locally (a dead feed, an empty article page or a failed summary only
//! shrink the data). Only configuration and page output failures end the run with an error.

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{OutputSettings, PipelineSettings, Settings};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::info;

use crate::ingestion::{collect_feed_items, FeedSource, HttpFeedSource};
use crate::llm::remote::RemoteLlmProvider;
use crate::llm::summarizer::Summarizer;
use crate::llm::LlmProvider;
use crate::models::{display_domain, FeedItem, PickedItem, RenderedPost, ScoredCandidate};
use crate::observe::RunObserver;
use crate::render::write_page;
use crate::scoring::{is_admissible, score_weirdness};
use crate::scraping::{ArticleFetcher, ArticleSource};
use crate::selection::{SelectionLimits, Selector};

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub collected: usize,
    pub candidates: usize,
    pub picked: Vec<PickedItem>,
    pub posts: Vec<RenderedPost>,
    pub remote_summaries: usize,
}

pub struct Pipeline {
    settings: PipelineSettings,
    output: OutputSettings,
    concurrency: usize,
    feeds: Arc<dyn FeedSource>,
    articles: Arc<dyn ArticleSource>,
    summarizer: Summarizer,
    observer: Arc<dyn RunObserver>,
}

impl Pipeline {
    pub fn new(
        settings: &Settings,
        feeds: Arc<dyn FeedSource>,
        articles: Arc<dyn ArticleSource>,
        provider: Option<Arc<dyn LlmProvider>>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            settings: settings.pipeline.clone(),
            output: settings.output.clone(),
            concurrency: settings.fetch.concurrency.max(1),
            feeds,
            articles,
            summarizer: Summarizer::new(provider).with_settings(&settings.llm),
            observer,
        }
    }

    /// Wire the HTTP sources and, when a credential is configured, the remote summarizer.
    pub fn from_settings(settings: &Settings, observer: Arc<dyn RunObserver>) -> Result<Self> {
        let feeds = HttpFeedSource::new(settings.fetch.timeout_seconds, &settings.fetch.user_agent)?;
        let articles = ArticleFetcher::new(settings.fetch.timeout_seconds, &settings.fetch.user_agent)?;

        let provider: Option<Arc<dyn LlmProvider>> =
            settings.pipeline.summarizer_credential.as_deref().map(|key| {
                let remote = RemoteLlmProvider::from_settings(&settings.llm, key, &settings.pipeline.model_name);
                info!("Remote summarizer enabled: {}", remote.model());
                Arc::new(remote) as Arc<dyn LlmProvider>
            });
        if provider.is_none() {
            info!("No summarizer credential configured; captions use the local fallback");
        }

        Ok(Self::new(settings, Arc::new(feeds), Arc::new(articles), provider, observer))
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run with a fixed timestamp for the page's date placeholder.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let items = collect_feed_items(
            self.feeds.as_ref(),
            &self.settings.feed_urls,
            self.settings.per_feed_cap,
            self.concurrency,
        )
        .await;
        self.observer.event(
            "feeds_collected",
            &[
                ("feeds", self.settings.feed_urls.len().to_string()),
                ("items", items.len().to_string()),
            ],
        );

        let candidates = self.score_candidates(&items).await;

        let limits = SelectionLimits {
            target_count: self.settings.target_count,
            domain_cap: self.settings.domain_cap,
        };
        let picked = Selector::new(limits, self.observer.as_ref()).select(candidates.clone(), &items);

        let mut posts = Vec::with_capacity(picked.len());
        let mut remote_summaries = 0;
        for pick in &picked {
            let domain = display_domain(&pick.item.link);
            let caption = self.summarizer.summarize(&pick.body, &domain).await;
            if caption.remote {
                remote_summaries += 1;
            } else {
                let reason = if self.summarizer.is_remote() { "remote_failed" } else { "no_credential" };
                self.observer.event(
                    "summary_fallback",
                    &[("link", pick.item.link.clone()), ("reason", reason.to_string())],
                );
            }
            posts.push(RenderedPost {
                title: pick.item.title.clone(),
                link: pick.item.link.clone(),
                summary: caption.text,
            });
        }

        write_page(&self.output.template_path, &self.output.output_path, &posts, now).await?;
        self.observer.event(
            "page_written",
            &[
                ("path", self.output.output_path.display().to_string()),
                ("posts", posts.len().to_string()),
            ],
        );

        Ok(RunReport {
            collected: items.len(),
            candidates: candidates.len(),
            picked,
            posts,
            remote_summaries,
        })
    }

    /// Fetch every article (bounded concurrency, collection order kept), fall back to the
    /// feed hint, and keep the items that clear the admission threshold.
    async fn score_candidates(&self, items: &[FeedItem]) -> Vec<ScoredCandidate> {
        let articles = self.articles.as_ref();
        let texts: Vec<String> = stream::iter(items)
            .map(|item| async move { articles.fetch_text(&item.link).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut candidates = Vec::new();
        for (item, text) in items.iter().zip(texts) {
            let body = if text.trim().is_empty() {
                item.summary_hint.clone()
            } else {
                text
            };
            if body.trim().is_empty() {
                continue;
            }

            let score = score_weirdness(&item.title, &body);
            self.observer.event(
                "candidate_scored",
                &[("link", item.link.clone()), ("score", score.to_string())],
            );
            if is_admissible(score) {
                candidates.push(ScoredCandidate {
                    score,
                    item: item.clone(),
                    body,
                });
            }
        }
        candidates
    }
}
