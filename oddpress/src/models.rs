use serde::{Deserialize, Serialize};

/// One entry pulled from a feed. `link` is unique within a collection batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Feed-provided summary/description, possibly empty
    pub summary_hint: String,
}

impl FeedItem {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        summary_hint: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary_hint: summary_hint.into(),
        }
    }
}

/// A feed item with the text it was scored on.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub score: i32,
    pub item: FeedItem,
    /// Full article text, the summary hint, or the title (title-only tier)
    pub body: String,
}

/// Which selection phase admitted an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTier {
    Capped,
    TopUp,
    TitleOnly,
}

impl SelectionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionTier::Capped => "capped",
            SelectionTier::TopUp => "top_up",
            SelectionTier::TitleOnly => "title_only",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickedItem {
    pub item: FeedItem,
    pub body: String,
    pub tier: SelectionTier,
}

/// What the renderer receives for each picked item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPost {
    pub title: String,
    pub link: String,
    pub summary: String,
}

/// Host of `link` with a leading `www.` removed. Empty when the link does not parse.
pub fn display_domain(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_domain() {
        assert_eq!(display_domain("https://www.example.com/a/b?c=d"), "example.com");
        assert_eq!(display_domain("http://news.example.co.uk/x"), "news.example.co.uk");
        assert_eq!(display_domain("https://WWW.Example.com"), "example.com");
        assert_eq!(display_domain("http://127.0.0.1:8080/article"), "127.0.0.1");
        assert_eq!(display_domain("not a url"), "");
        assert_eq!(display_domain(""), "");
    }

    #[test]
    fn test_www_only_stripped_at_start() {
        assert_eq!(display_domain("https://shop.www.example.com/"), "shop.www.example.com");
    }
}
