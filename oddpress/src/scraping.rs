use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Wide enough that html2text never wraps a sentence mid-phrase.
const TEXT_WIDTH: usize = 10_000;

/// Page chrome removed before extraction.
const BOILERPLATE: &str = "nav, header, footer, aside, script, style, noscript, form, table, iframe, svg";

const CONTENT_SELECTORS: [&str; 5] = ["article", "main", ".post-content", ".entry-content", "#content"];

/// Turns an article URL into readable plain text.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Readable text of the page at `url`. Any failure yields an empty string.
    async fn fetch_text(&self, url: &str) -> String;
}

pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.context("failed to fetch article page")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("article fetch failed with status: {}", status));
        }

        response.text().await.context("failed to read response body")
    }
}

#[async_trait]
impl ArticleSource for ArticleFetcher {
    async fn fetch_text(&self, url: &str) -> String {
        let page_url = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                debug!("scraping: unparseable article URL {}: {}", url, e);
                return String::new();
            }
        };

        match self.fetch_html(url).await {
            Ok(html) => {
                let text = extract_readable_text(&html, &page_url);
                debug!("scraping: extracted {} chars from {}", text.len(), url);
                text
            }
            Err(e) => {
                debug!("scraping: {} -> {:#}", url, e);
                String::new()
            }
        }
    }
}

/// Re-serialize `html` without navigation, tables, comments, scripts and other chrome.
pub fn strip_boilerplate(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let mut ids: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| node.value().is_comment())
        .map(|node| node.id())
        .collect();
    if let Ok(selector) = Selector::parse(BOILERPLATE) {
        ids.extend(document.select(&selector).map(|element| element.id()));
    }

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.root_element().html()
}

/// Visible text of an HTML fragment (feed descriptions are often markup), whitespace collapsed.
pub fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn html_to_text(html: &str) -> Option<String> {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn readability_text(html: &str, page_url: &Url) -> Option<String> {
    let mut reader = Cursor::new(html.as_bytes());
    match readability::extractor::extract(&mut reader, page_url) {
        Ok(product) => html_to_text(&product.content).or_else(|| {
            let text = product.text.trim().to_string();
            (!text.is_empty()).then_some(text)
        }),
        Err(e) => {
            debug!("scraping: readability failed for {}: {}", page_url, e);
            None
        }
    }
}

fn selector_text(document: &Html) -> Option<String> {
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(text) = document
            .select(&selector)
            .next()
            .and_then(|element| html_to_text(&element.html()))
        {
            debug!("scraping: using selector '{}'", selector_str);
            return Some(text);
        }
    }

    let paragraphs = Selector::parse("p").ok()?;
    let joined: String = document
        .select(&paragraphs)
        .map(|element| element.html() + "\n")
        .collect();
    html_to_text(&joined)
}

/// Main readable text of an HTML page: boilerplate removed, readability first,
/// then content selectors, then every `<p>`. Empty when nothing readable remains.
pub fn extract_readable_text(html: &str, page_url: &Url) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let cleaned = strip_boilerplate(html);
    if let Some(text) = readability_text(&cleaned, page_url) {
        return text;
    }

    selector_text(&Html::parse_document(&cleaned)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Llama news</title><script>var tracking = "llama";</script></head>
<body>
<nav><a href="/">Home</a> <a href="/weird">Subscribe to the newsletter</a></nav>
<article>
<h1>Escaped llama tours city hall</h1>
<p>A llama named Dolly escaped from a petting zoo on Tuesday morning and wandered into city hall.</p>
<!-- syndication partner: wombat-feed-7 -->
<p>Staff said the animal spent twenty minutes in the council chamber before being led back outside.</p>
<table><tr><td>Share price</td><td>ticker-zz-42</td></tr></table>
</article>
<footer>Copyright notice and cookie banner text</footer>
</body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://news.example.com/llama").unwrap()
    }

    #[test]
    fn test_strip_boilerplate_removes_chrome() {
        let cleaned = strip_boilerplate(PAGE);
        assert!(!cleaned.contains("Subscribe to the newsletter"));
        assert!(!cleaned.contains("cookie banner"));
        assert!(!cleaned.contains("tracking"));
        assert!(!cleaned.contains("ticker-zz-42"));
        assert!(!cleaned.contains("wombat-feed-7"));
        assert!(cleaned.contains("petting zoo"));
    }

    #[test]
    fn test_extract_keeps_article_paragraphs() {
        let text = extract_readable_text(PAGE, &page_url());
        assert!(text.contains("petting zoo"), "got: {text}");
        assert!(text.contains("council chamber"), "got: {text}");
        assert!(!text.contains("Subscribe to the newsletter"));
        assert!(!text.contains("cookie banner"));
        assert!(!text.contains("ticker-zz-42"));
        assert!(!text.contains("wombat-feed-7"));
    }

    #[test]
    fn test_fragment_text_drops_markup() {
        assert_eq!(
            fragment_text("<p>A <b>goat</b> won\n the vote.</p><img src=\"x.png\">"),
            "A goat won the vote."
        );
        assert_eq!(fragment_text("plain words"), "plain words");
        assert_eq!(fragment_text(""), "");
    }

    #[test]
    fn test_extract_empty_page_is_empty() {
        assert_eq!(extract_readable_text("", &page_url()), "");
        assert_eq!(extract_readable_text("   \n", &page_url()), "");
    }

    #[test]
    fn test_selector_text_prefers_article_then_paragraphs() {
        let document = Html::parse_document(
            "<html><body><div><p>stray one</p></div><article><p>inside the article</p></article></body></html>",
        );
        assert_eq!(selector_text(&document).as_deref(), Some("inside the article"));

        let document = Html::parse_document("<html><body><div><p>first</p><p>second</p></div></body></html>");
        let text = selector_text(&document).unwrap_or_default();
        assert!(text.contains("first") && text.contains("second"));
    }
}
