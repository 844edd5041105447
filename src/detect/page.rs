// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page snapshot: a parsed HTML document plus its URL.
//!
//! The host hands the engine a snapshot per evaluation pass (focus-in,
//! input, click, route change). Event targets are identified by CSS
//! selectors resolved against the snapshot, which keeps the engine testable
//! without a live DOM.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed page at a point in time.
pub struct PageView {
    document: Html,
    url: Url,
}

impl PageView {
    /// Parse raw HTML against the page URL it was captured from.
    pub fn parse(html: &str, page_url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(page_url)?;
        Ok(Self {
            document: Html::parse_document(html),
            url,
        })
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hostname without port or path (empty for hostless URLs).
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    /// URL path component.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Origin URL (scheme + host), used as the fallback analysis target when
    /// no policy links were discovered on the page.
    pub fn origin_url(&self) -> String {
        match self.url.host_str() {
            Some(host) => format!("{}://{}", self.url.scheme(), host),
            None => self.url.to_string(),
        }
    }

    /// First element matching a CSS selector, if any. Invalid selectors
    /// resolve to `None` rather than erroring; selector strings arrive from
    /// the host and are untrusted.
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.document.select(&selector).next()
    }

    /// All visible text under `<body>`, whitespace-collapsed and lowercased.
    pub fn body_text_lower(&self) -> String {
        if let Ok(sel) = Selector::parse("body") {
            if let Some(body) = self.document.select(&sel).next() {
                return element_text(&body).to_lowercase();
            }
        }
        String::new()
    }
}

/// Collect all text content from an element, trimmed and whitespace-collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if `el` is `container` or a descendant of it.
pub fn is_within(el: &ElementRef<'_>, container: &ElementRef<'_>) -> bool {
    if el.id() == container.id() {
        return true;
    }
    el.ancestors().any(|node| node.id() == container.id())
}

/// Extract the registrable hostname from any URL-ish string. Accepts both
/// host-only values and full URLs; returns an empty string when nothing
/// parseable is present.
pub fn domain_of(raw: &str) -> String {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return String::new();
    }
    let with_scheme = if candidate.contains("://") {
        candidate.to_string()
    } else {
        format!("https://{candidate}")
    };
    Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
