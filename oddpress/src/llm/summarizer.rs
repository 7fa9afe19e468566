// Caption generation with a deterministic local fallback
use common::LlmSettings;
use std::sync::Arc;
use tracing::{info, warn};

use super::{LlmProvider, LlmRequest};

/// Characters of article text sent to the model
pub const PROMPT_TEXT_CHARS: usize = 4000;
/// Width of the fallback caption before the attribution suffix
pub const FALLBACK_WIDTH: usize = 180;
pub const PLACEHOLDER: &str = "…";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    /// True when the text came from the remote model
    pub remote: bool,
}

pub struct Summarizer {
    provider: Option<Arc<dyn LlmProvider>>,
    max_tokens: usize,
    temperature: f32,
    timeout_seconds: u64,
}

impl Summarizer {
    /// `None` disables remote calls; every caption is then the local fallback.
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let defaults = LlmSettings::default();
        Self {
            provider,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout_seconds: defaults.timeout_seconds,
        }
    }

    /// Generation limits sent with every caption request.
    pub fn with_settings(mut self, settings: &LlmSettings) -> Self {
        self.max_tokens = settings.max_tokens;
        self.temperature = settings.temperature;
        self.timeout_seconds = settings.timeout_seconds;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.provider.is_some()
    }

    /// Produce a short playful caption for `body`, ending with an attribution to `domain`.
    /// Never fails: remote errors and empty replies degrade to [`fallback_caption`].
    pub async fn summarize(&self, body: &str, domain: &str) -> Caption {
        let Some(provider) = &self.provider else {
            return Caption {
                text: fallback_caption(body, domain),
                remote: false,
            };
        };

        let request = LlmRequest {
            prompt: build_prompt(body, domain),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            timeout_seconds: Some(self.timeout_seconds),
        };

        match provider.generate(request).await {
            Ok(response) => {
                let text = response.content.trim();
                if text.is_empty() {
                    warn!("LLM returned an empty caption for {}, using fallback", domain);
                    return Caption {
                        text: fallback_caption(body, domain),
                        remote: false,
                    };
                }
                info!(
                    "LLM caption for {}: {} tokens ({})",
                    domain, response.usage.total_tokens, response.model
                );
                Caption {
                    text: text.to_string(),
                    remote: true,
                }
            }
            Err(e) => {
                warn!("LLM summarization failed: {:#}, falling back to shortened text", e);
                Caption {
                    text: fallback_caption(body, domain),
                    remote: false,
                }
            }
        }
    }
}

pub fn build_prompt(body: &str, domain: &str) -> String {
    let excerpt: String = body.chars().take(PROMPT_TEXT_CHARS).collect();
    format!(
        "Summarize this odd/quirky news item in 1–2 punchy sentences (max ~70 words). \
         Be light and playful but not mean or insensitive. Include 0–1 emoji at most. \
         End with '— via {}'.\n\nTEXT:\n{}",
        domain, excerpt
    )
}

/// Whitespace-collapsed body shortened to [`FALLBACK_WIDTH`], then ` — via {domain}`.
pub fn fallback_caption(body: &str, domain: &str) -> String {
    let mut caption = shorten(body, FALLBACK_WIDTH, PLACEHOLDER);
    if !caption.is_empty() {
        caption.push(' ');
    }
    caption.push_str("— via ");
    caption.push_str(domain);
    caption
}

/// Collapse whitespace and, if the result is wider than `width` chars, cut at a word
/// boundary so that the kept words plus `placeholder` fit in `width`.
/// A single word longer than the budget is cut mid-word.
pub fn shorten(text: &str, width: usize, placeholder: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(placeholder.chars().count());
    let mut out = String::new();
    let mut used = 0;
    for word in &words {
        let needed = word.chars().count() + usize::from(!out.is_empty());
        if used + needed > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }

    if out.is_empty() {
        out = words
            .first()
            .map(|w| w.chars().take(budget).collect())
            .unwrap_or_default();
    }
    out.push_str(placeholder);
    out
}
