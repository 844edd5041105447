// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fetch/poll orchestrator.
//!
//! `request_insight` never blocks the triggering call: it claims the tab's
//! fetch slot, spawns a task, and returns a cancellation handle. The task
//! polls `/process` while the backend answers 202, bounded by the configured
//! attempt count, then reconciles the two summary sources (embedded vs the
//! separate top-risks endpoint) into a [`PrivacyInsight`] delivered over the
//! event bus. Every exit path delivers *some* insight: network errors,
//! parse failures, and poll exhaustion all degrade to fallbacks.
//!
//! Cancellation is cooperative: the flag is checked between poll attempts
//! and again before delivery. An in-flight HTTP request is never aborted;
//! its result is simply discarded when the flag is set.

use crate::backend::client::{AnalysisClient, ProcessStatus, TopRisksSummary};
use crate::backend::tabs::TabRegistry;
use crate::config::EngineConfig;
use crate::events::{EventBus, SentraEvent, TabId};
use crate::overlay::insight::PrivacyInsight;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation handle for one fetch task.
#[derive(Clone)]
pub struct PollHandle {
    cancel: Arc<AtomicBool>,
}

impl PollHandle {
    fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// Orchestrates analysis fetches for all tabs.
pub struct FetchOrchestrator {
    client: AnalysisClient,
    tabs: Arc<TabRegistry>,
    events: Arc<EventBus>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl FetchOrchestrator {
    pub fn new(config: &EngineConfig, tabs: Arc<TabRegistry>, events: Arc<EventBus>) -> Self {
        Self {
            client: AnalysisClient::new(&config.backend_base_url, config.request_timeout_ms),
            tabs,
            events,
            poll_interval: config.poll_interval(),
            max_poll_attempts: config.max_poll_attempts,
        }
    }

    /// Start an analysis fetch for a tab. Returns `None` (a no-op) when a
    /// fetch is already in flight for this tab (the at-most-one invariant).
    ///
    /// `candidates` are the discovered policy URLs; when empty the page
    /// origin is the single fallback target.
    pub fn request_insight(
        &self,
        tab: TabId,
        domain: String,
        path: String,
        candidates: Vec<String>,
        origin_fallback: String,
    ) -> Option<PollHandle> {
        if !self.tabs.begin_fetch(tab) {
            tracing::debug!("fetch already in flight for tab {tab}, ignoring");
            return None;
        }

        let urls = if candidates.is_empty() {
            vec![origin_fallback]
        } else {
            candidates
        };

        let handle = PollHandle::new();
        let task_handle = handle.clone();
        let client = self.client.clone();
        let tabs = Arc::clone(&self.tabs);
        let events = Arc::clone(&self.events);
        let poll_interval = self.poll_interval;
        let max_attempts = self.max_poll_attempts;

        events.emit(SentraEvent::FetchStarted {
            tab,
            domain: domain.clone(),
        });

        tokio::spawn(async move {
            run_fetch(
                client,
                tabs,
                events,
                task_handle,
                tab,
                domain,
                path,
                urls,
                poll_interval,
                max_attempts,
            )
            .await;
        });

        Some(handle)
    }
}

/// How one fetch attempt sequence ended.
enum FetchEnd {
    Ready(Value),
    Exhausted(u32),
    Failed(String),
    Cancelled,
}

#[allow(clippy::too_many_arguments)]
async fn run_fetch(
    client: AnalysisClient,
    tabs: Arc<TabRegistry>,
    events: Arc<EventBus>,
    handle: PollHandle,
    tab: TabId,
    domain: String,
    path: String,
    urls: Vec<String>,
    poll_interval: Duration,
    max_attempts: u32,
) {
    let end = poll_until_ready(&client, &handle, &urls, poll_interval, max_attempts).await;

    let (insight, result, error) = match end {
        FetchEnd::Ready(body) => {
            let insight = match embedded_summary(&body) {
                Some(summary) => PrivacyInsight::from_summary(&domain, &summary),
                None => {
                    let separate = client.top_risks(&domain).await.ok();
                    resolve_without_embedded(&domain, &body, separate)
                }
            };
            (insight, Some(body), None)
        }
        FetchEnd::Exhausted(attempts) => {
            tracing::info!("analysis for {domain} not ready after {attempts} attempts");
            events.emit(SentraEvent::PollExhausted {
                tab,
                domain: domain.clone(),
                attempts,
            });
            // Soft failure: no result, but not an error either.
            (PrivacyInsight::fallback(&domain), None, None)
        }
        FetchEnd::Failed(error) => {
            tracing::warn!("analysis fetch for {domain} failed: {error}");
            events.emit(SentraEvent::FetchFailed {
                tab,
                domain: domain.clone(),
                error: error.clone(),
            });
            (
                PrivacyInsight::fallback_with_error(&domain, &error),
                None,
                Some(error),
            )
        }
        FetchEnd::Cancelled => {
            tabs.finish_fetch(tab, None, None);
            return;
        }
    };

    tabs.finish_fetch(tab, result, error);

    // Navigation may have happened while the response was in the air; the
    // lifecycle layer re-checks path and visibility, this check just avoids
    // a pointless push.
    if handle.is_cancelled() {
        tracing::debug!("dropping insight for {domain}: fetch was cancelled");
        return;
    }

    events.emit(SentraEvent::InsightReady {
        tab,
        domain,
        path,
        insight,
    });
}

/// Poll `/process` until a terminal outcome: a ready body, a terminal
/// status/network failure, attempt exhaustion, or cancellation. One attempt
/// is counted per request sent.
async fn poll_until_ready(
    client: &AnalysisClient,
    handle: &PollHandle,
    urls: &[String],
    poll_interval: Duration,
    max_attempts: u32,
) -> FetchEnd {
    let mut attempts = 0u32;

    loop {
        if handle.is_cancelled() {
            return FetchEnd::Cancelled;
        }

        attempts += 1;
        match client.process(urls).await {
            Ok(ProcessStatus::Ready(body)) => return FetchEnd::Ready(body),
            Ok(ProcessStatus::Pending) => {
                if attempts >= max_attempts {
                    return FetchEnd::Exhausted(attempts);
                }
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => return FetchEnd::Failed(e.to_string()),
        }
    }
}

/// Parse the summary embedded in a `/process` body, if it is usable (at
/// least one high-risk attribute).
fn embedded_summary(body: &Value) -> Option<TopRisksSummary> {
    let raw = body.get("overlay_summary")?;
    let summary: TopRisksSummary = serde_json::from_value(raw.clone()).ok()?;
    summary.has_high_risk().then_some(summary)
}

/// Reconcile the separate top-risks response with the raw analysis: use the
/// summary when it carries attributes, otherwise the generic transform.
fn resolve_without_embedded(
    domain: &str,
    body: &Value,
    separate: Option<TopRisksSummary>,
) -> PrivacyInsight {
    match separate.filter(|s| s.has_high_risk()) {
        Some(summary) => PrivacyInsight::from_summary(domain, &summary),
        None => PrivacyInsight::from_analysis(domain, body),
    }
}
