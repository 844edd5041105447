// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Policy/terms link scanner.
//!
//! Pure DOM read: walks every anchor, matches the combined lowercased
//! text + href + title against the policy keyword set, and resolves hrefs
//! against the page URL. Anchors whose href fails to resolve are skipped;
//! a malformed link must never abort the scan.

use crate::detect::keywords::{contains_any, POLICY_LINK_KEYWORDS};
use crate::detect::page::{element_text, PageView};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Link text is truncated to this many characters before being reported.
const MAX_LINK_TEXT: usize = 200;

/// A candidate policy/terms document discovered on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLink {
    pub url: String,
    pub text: String,
}

/// Scan a page for policy/terms links, deduplicated by absolute URL and
/// reported in document order.
pub fn scan_policy_links(page: &PageView) -> Vec<PolicyLink> {
    let anchor_sel = Selector::parse("a[href]").expect("anchor selector is valid");

    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for anchor in page.document().select(&anchor_sel) {
        let href = anchor.value().attr("href").unwrap_or("");
        let text = element_text(&anchor);
        let title = anchor.value().attr("title").unwrap_or("");

        let combined = format!("{} {} {}", text, href, title).to_lowercase();
        if !contains_any(&combined, POLICY_LINK_KEYWORDS) {
            continue;
        }

        // Resolve against the page URL; skip silently on failure.
        let absolute = match page.url().join(href) {
            Ok(u) => u.to_string(),
            Err(e) => {
                tracing::debug!("skipping unresolvable policy href {href:?}: {e}");
                continue;
            }
        };

        if !seen.insert(absolute.clone()) {
            continue;
        }

        links.push(PolicyLink {
            url: absolute,
            text: truncate_chars(&text, MAX_LINK_TEXT),
        });
    }

    links
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> PageView {
        PageView::parse(html, "https://example.com/signup").unwrap()
    }

    #[test]
    fn test_scan_matches_text_href_and_title() {
        let p = page(
            r#"<html><body>
            <a href="/legal/terms">Terms of Service</a>
            <a href="/privacy">How we handle data</a>
            <a href="/about" title="cookie policy">About</a>
            <a href="/pricing">Pricing</a>
            </body></html>"#,
        );
        let links = scan_policy_links(&p);
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/legal/terms",
                "https://example.com/privacy",
                "https://example.com/about",
            ]
        );
    }

    #[test]
    fn test_scan_dedups_by_absolute_url() {
        let p = page(
            r#"<html><body>
            <a href="/terms">Terms</a>
            <a href="https://example.com/terms">Terms of Service</a>
            </body></html>"#,
        );
        let links = scan_policy_links(&p);
        assert_eq!(links.len(), 1);
        // First examined wins
        assert_eq!(links[0].text, "Terms");
    }

    #[test]
    fn test_scan_skips_malformed_href() {
        let p = page(
            r#"<html><body>
            <a href="https://[not-a-host/terms">Terms</a>
            <a href="/privacy">Privacy Policy</a>
            </body></html>"#,
        );
        let links = scan_policy_links(&p);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/privacy");
    }

    #[test]
    fn test_link_text_truncated() {
        let long = "privacy ".repeat(60);
        let html = format!(r#"<html><body><a href="/privacy">{long}</a></body></html>"#);
        let links = scan_policy_links(&page(&html));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text.chars().count(), 200);
    }
}
