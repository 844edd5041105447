//! CLI subcommand implementations for the Sentra binary.

pub mod cached_cmd;
pub mod detect_cmd;
pub mod insight_cmd;
pub mod links_cmd;

use crate::detect::page::PageView;
use anyhow::{Context, Result};

/// Load a page snapshot from a URL or a local HTML file.
///
/// For a file source, `page_url` supplies the URL the snapshot should be
/// evaluated under (path signals, link resolution); it defaults to a
/// placeholder origin.
pub async fn load_page(source: &str, page_url: Option<&str>) -> Result<PageView> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let body = reqwest::get(source)
            .await
            .with_context(|| format!("failed to fetch {source}"))?
            .text()
            .await
            .context("failed to read response body")?;
        let url = page_url.unwrap_or(source);
        Ok(PageView::parse(&body, url)?)
    } else {
        let html = std::fs::read_to_string(source)
            .with_context(|| format!("failed to read {source}"))?;
        let url = page_url.unwrap_or("https://page.local/");
        Ok(PageView::parse(&html, url)?)
    }
}
