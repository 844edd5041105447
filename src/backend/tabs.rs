// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process-wide per-tab analysis state.
//!
//! Created once at engine start and passed by reference into the
//! orchestrator; entries are removed when the host reports a tab closed and
//! there is no other teardown. The in-flight set is the single piece of
//! shared mutable state touched from concurrent handlers: `DashSet::insert`
//! is the atomic check-then-set that keeps the at-most-one-fetch-per-tab
//! invariant on a multi-threaded runtime.

use crate::detect::links::PolicyLink;
use crate::events::TabId;
use dashmap::{DashMap, DashSet};
use serde_json::Value;

/// Cached analysis state for one tab.
#[derive(Debug, Default, Clone)]
pub struct TabAnalysis {
    /// Policy links discovered on the tab's page.
    pub links: Vec<PolicyLink>,
    /// Raw analysis from the last successful fetch.
    pub last_result: Option<Value>,
    /// Terminal error from the last fetch, if it failed.
    pub last_error: Option<String>,
    /// A fetch task is currently running for this tab.
    pub loading: bool,
}

/// Registry of per-tab analysis state plus the in-flight fetch set.
pub struct TabRegistry {
    tabs: DashMap<TabId, TabAnalysis>,
    in_flight: DashSet<TabId>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: DashMap::new(),
            in_flight: DashSet::new(),
        }
    }

    /// Record discovered policy links for a tab, creating its entry.
    pub fn set_links(&self, tab: TabId, links: Vec<PolicyLink>) {
        self.tabs.entry(tab).or_default().links = links;
    }

    pub fn links(&self, tab: TabId) -> Vec<PolicyLink> {
        self.tabs
            .get(&tab)
            .map(|t| t.links.clone())
            .unwrap_or_default()
    }

    /// Try to claim the fetch slot for a tab. Returns false when a fetch is
    /// already in flight, in which case the caller must no-op.
    pub fn begin_fetch(&self, tab: TabId) -> bool {
        if !self.in_flight.insert(tab) {
            return false;
        }
        self.tabs.entry(tab).or_default().loading = true;
        true
    }

    /// Release the fetch slot and record the outcome.
    pub fn finish_fetch(&self, tab: TabId, result: Option<Value>, error: Option<String>) {
        {
            let mut entry = self.tabs.entry(tab).or_default();
            entry.loading = false;
            if result.is_some() {
                entry.last_result = result;
            }
            entry.last_error = error;
        }
        self.in_flight.remove(&tab);
    }

    pub fn is_loading(&self, tab: TabId) -> bool {
        self.in_flight.contains(&tab)
    }

    pub fn analysis(&self, tab: TabId) -> Option<TabAnalysis> {
        self.tabs.get(&tab).map(|t| t.value().clone())
    }

    /// Tear down a closed tab's state.
    pub fn remove_tab(&self, tab: TabId) {
        self.tabs.remove(&tab);
        self.in_flight.remove(&tab);
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_begin_fetch_claims_once() {
        let registry = TabRegistry::new();
        assert!(registry.begin_fetch(1));
        assert!(!registry.begin_fetch(1));
        assert!(registry.begin_fetch(2));
        assert!(registry.is_loading(1));
    }

    #[test]
    fn test_finish_releases_slot_and_records() {
        let registry = TabRegistry::new();
        registry.begin_fetch(1);
        registry.finish_fetch(1, Some(json!({"ok": true})), None);

        assert!(!registry.is_loading(1));
        assert!(registry.begin_fetch(1));
        let analysis = registry.analysis(1).unwrap();
        assert!(analysis.last_result.is_some());
        assert!(analysis.last_error.is_none());
    }

    #[test]
    fn test_error_kept_without_clobbering_result() {
        let registry = TabRegistry::new();
        registry.begin_fetch(1);
        registry.finish_fetch(1, Some(json!({"ok": true})), None);
        registry.begin_fetch(1);
        registry.finish_fetch(1, None, Some("boom".to_string()));

        let analysis = registry.analysis(1).unwrap();
        // Earlier successful result survives a later failed refresh.
        assert!(analysis.last_result.is_some());
        assert_eq!(analysis.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_remove_tab_clears_everything() {
        let registry = TabRegistry::new();
        registry.set_links(
            1,
            vec![PolicyLink {
                url: "https://example.com/privacy".to_string(),
                text: "Privacy".to_string(),
            }],
        );
        registry.begin_fetch(1);
        registry.remove_tab(1);

        assert!(registry.analysis(1).is_none());
        assert!(registry.is_empty());
        // Slot freed too
        assert!(registry.begin_fetch(1));
    }
}
