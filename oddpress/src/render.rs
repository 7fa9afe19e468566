use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

use crate::models::{display_domain, RenderedPost};

pub const POSTS_PLACEHOLDER: &str = "{{POSTS}}";
pub const DATE_PLACEHOLDER: &str = "{{DATE}}";
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_article(post: &RenderedPost) -> String {
    format!(
        "<article>\n  <a href=\"{link}\" target=\"_blank\" rel=\"noopener\">\n    <h1>{title}</h1>\n  </a>\n  <div>{summary}</div>\n  <div class=\"src\">{domain}</div>\n</article>",
        link = escape_html(&post.link),
        title = escape_html(&post.title),
        summary = escape_html(&post.summary),
        domain = escape_html(&display_domain(&post.link)),
    )
}

/// Fill the template. `{{DATE}}` is substituted before `{{POSTS}}` so that text inside
/// posts is never treated as a placeholder.
pub fn render_page(template: &str, posts: &[RenderedPost], now: DateTime<Utc>) -> String {
    let articles = posts
        .iter()
        .map(render_article)
        .collect::<Vec<_>>()
        .join("\n\n");

    template
        .replace(DATE_PLACEHOLDER, &now.format(DATE_FORMAT).to_string())
        .replace(POSTS_PLACEHOLDER, &articles)
}

/// Read the template, render, and write the page, creating the output directory if needed.
pub async fn write_page(
    template_path: &Path,
    output_path: &Path,
    posts: &[RenderedPost],
    now: DateTime<Utc>,
) -> Result<()> {
    let template = tokio::fs::read_to_string(template_path)
        .await
        .with_context(|| format!("Failed to read page template: {}", template_path.display()))?;

    let html = render_page(&template, posts, now);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    tokio::fs::write(output_path, html)
        .await
        .with_context(|| format!("Failed to write page: {}", output_path.display()))?;

    info!(path = %output_path.display(), posts = posts.len(), "page written");
    Ok(())
}
