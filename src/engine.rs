// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! The Sentra engine: one process-wide object owning the stores, the tab
//! registry, the event bus, and the fetch orchestrator, and driving a
//! per-tab overlay controller from page events.
//!
//! The detection path is synchronous (page snapshots are `!Send`); only
//! owned data crosses into the spawned fetch tasks, and their results come
//! back over the event bus where [`Engine::start_dispatcher`] applies them
//! to whichever overlay is still interested.

use crate::backend::orchestrator::{FetchOrchestrator, PollHandle};
use crate::backend::tabs::TabRegistry;
use crate::config::EngineConfig;
use crate::detect::intent::{self, IntentOutcome, PageEvent};
use crate::detect::links::scan_policy_links;
use crate::detect::page::PageView;
use crate::events::{EventBus, SentraEvent, TabId};
use crate::navigation::NavigationObserver;
use crate::overlay::insight::PrivacyInsight;
use crate::overlay::lifecycle::{OverlayController, OverlayState, SurfaceOutcome};
use crate::protocol::{self, error_codes, Method, Request};
use crate::state::durable::DurableStore;
use crate::state::session::SessionStore;
use anyhow::Result;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// What one page event did.
#[derive(Debug)]
pub struct PageEventReport {
    pub intent: IntentOutcome,
    /// Set when the aggregator asked to surface; records what happened.
    pub surface: Option<SurfaceOutcome>,
    pub overlay_state: OverlayState,
}

pub struct Engine {
    config: EngineConfig,
    events: Arc<EventBus>,
    tabs: Arc<TabRegistry>,
    orchestrator: FetchOrchestrator,
    session: Mutex<SessionStore>,
    durable: Mutex<DurableStore>,
    overlays: DashMap<TabId, OverlayController>,
    polls: DashMap<TabId, PollHandle>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_session(config, SessionStore::in_memory())
    }

    /// Build with a caller-supplied session scope (hosts with their own
    /// session-lifetime storage, tests with failing scopes).
    pub fn with_session(config: EngineConfig, session: SessionStore) -> Result<Self> {
        let events = Arc::new(EventBus::new(64));
        let tabs = Arc::new(TabRegistry::new());
        let orchestrator = FetchOrchestrator::new(&config, Arc::clone(&tabs), Arc::clone(&events));
        let durable = DurableStore::open(&config.resolved_data_dir())?;

        Ok(Self {
            config,
            events,
            tabs,
            orchestrator,
            session: Mutex::new(session),
            durable: Mutex::new(durable),
            overlays: DashMap::new(),
            polls: DashMap::new(),
        })
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn tabs(&self) -> Arc<TabRegistry> {
        Arc::clone(&self.tabs)
    }

    /// Spawn the dispatcher that applies pushed insights to overlays. Call
    /// once after construction when running inside a tokio runtime.
    pub fn start_dispatcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut rx = self.events.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SentraEvent::InsightReady {
                        tab, path, insight, ..
                    }) => {
                        engine.apply_insight(tab, &path, insight);
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("insight dispatcher lagged, skipped {skipped} events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Evaluate a page event for a tab: recompute intent, maintain the
    /// journey window, and surface + fetch when the aggregator says so.
    pub fn handle_page_event(
        &self,
        tab: TabId,
        page: &PageView,
        event: &PageEvent,
    ) -> PageEventReport {
        let host = page.host().to_string();
        let path = page.path().to_string();
        let now = Utc::now();

        // Keep the tab's candidate policy links current; the fetch uses them.
        let links = scan_policy_links(page);
        if !links.is_empty() {
            self.tabs.set_links(tab, links);
        }

        let journey_active = self.session.lock().unwrap().journey_active(&host, now);
        let outcome = intent::evaluate_with_threshold(
            page,
            event,
            journey_active,
            self.config.confidence_threshold,
        );

        // Fresh signals (and the auth-click fast path) renew the journey
        // window; the journey signal itself never does.
        if outcome.signals.any_fresh() || outcome.auth_click {
            self.session
                .lock()
                .unwrap()
                .renew_journey(&host, now, self.config.journey_ttl());
        }

        if outcome.detected {
            self.events.emit(SentraEvent::IntentDetected {
                host: host.clone(),
                path: path.clone(),
                signals: outcome.signals.fired(),
                confidence: outcome.confidence,
            });
        }

        let mut controller = self.controller_for(tab, &host, &path);

        let surface = if outcome.surface {
            let mut session = self.session.lock().unwrap();
            let mut durable = self.durable.lock().unwrap();
            let result = controller.request_surface(&mut session, &mut durable, now);
            drop(durable);
            drop(session);

            if let SurfaceOutcome::Surfaced { needs_fetch } = result {
                self.events.emit(SentraEvent::OverlaySurfaced {
                    tab,
                    host: host.clone(),
                    path: path.clone(),
                });
                if needs_fetch {
                    let candidates: Vec<String> =
                        self.tabs.links(tab).into_iter().map(|l| l.url).collect();
                    if let Some(handle) = self.orchestrator.request_insight(
                        tab,
                        host.clone(),
                        path.clone(),
                        candidates,
                        page.origin_url(),
                    ) {
                        self.polls.insert(tab, handle);
                    }
                }
            }
            Some(result)
        } else {
            None
        };

        PageEventReport {
            overlay_state: controller.state(),
            intent: outcome,
            surface,
        }
    }

    /// Build a navigation observer wired to this engine for one tab, seeded
    /// with the tab's current path so the first report is not itself a
    /// change. The host reports every observed location to it; the engine
    /// reacts once per distinct path, however the host detects changes.
    pub fn navigation_observer(self: &Arc<Self>, tab: TabId, current_path: &str) -> NavigationObserver {
        let observer = NavigationObserver::new();
        observer.observe(current_path);
        let engine = Arc::clone(self);
        observer.on_route_change(move |change| {
            engine.handle_route_change(tab, &change.path);
        });
        observer
    }

    /// SPA navigation: cancel any pending poll and reset per-page state.
    pub fn handle_route_change(&self, tab: TabId, new_path: &str) {
        if let Some((_, handle)) = self.polls.remove(&tab) {
            handle.cancel();
        }
        if let Some(mut controller) = self.overlays.get_mut(&tab) {
            controller.on_route_change(new_path);
        }
    }

    /// Apply an asynchronously delivered insight to a tab's overlay.
    /// Returns false if the update was stale and dropped.
    pub fn apply_insight(&self, tab: TabId, path: &str, insight: PrivacyInsight) -> bool {
        match self.overlays.get_mut(&tab) {
            Some(mut controller) => controller.apply_insight(path, insight),
            None => false,
        }
    }

    /// User dismissed the overlay.
    pub fn dismiss(&self, tab: TabId) {
        if let Some(mut controller) = self.overlays.get_mut(&tab) {
            let host = controller.host().to_string();
            controller.dismiss(&mut self.session.lock().unwrap());
            self.events.emit(SentraEvent::OverlayDismissed { tab, host });
        }
    }

    /// User snoozed an origin for `minutes`.
    pub fn snooze(&self, domain: &str, minutes: i64) {
        let until = Utc::now() + Duration::minutes(minutes);
        self.durable.lock().unwrap().snooze(domain, until);
    }

    /// Host reports a tab closed; tear down its state.
    pub fn tab_closed(&self, tab: TabId) {
        if let Some((_, handle)) = self.polls.remove(&tab) {
            handle.cancel();
        }
        self.overlays.remove(&tab);
        self.tabs.remove_tab(tab);
        self.events.emit(SentraEvent::TabClosed { tab });
    }

    /// Current overlay state for a tab (Hidden when untracked).
    pub fn overlay_state(&self, tab: TabId) -> OverlayState {
        self.overlays
            .get(&tab)
            .map(|c| c.state())
            .unwrap_or(OverlayState::Hidden)
    }

    /// The insight currently rendered for a tab, if any.
    pub fn current_insight(&self, tab: TabId) -> Option<PrivacyInsight> {
        self.overlays.get(&tab).and_then(|c| c.insight().cloned())
    }

    fn controller_for(
        &self,
        tab: TabId,
        host: &str,
        path: &str,
    ) -> dashmap::mapref::one::RefMut<'_, TabId, OverlayController> {
        let mut controller = self
            .overlays
            .entry(tab)
            .or_insert_with(|| {
                OverlayController::new(host, path, self.config.session_suppression)
            });
        // Cross-origin navigation within the same tab: per-page state starts
        // over for the new site.
        if controller.host() != host {
            *controller =
                OverlayController::new(host, path, self.config.session_suppression);
        } else if controller.path() != path {
            // A route change the host never reported; treat it as one.
            controller.on_route_change(path);
        }
        controller
    }

    // ── Protocol surface ─────────────────────────────────────────────────────

    /// Handle one protocol request line, returning the response line.
    pub fn handle_request(&self, line: &str) -> String {
        let request = match protocol::parse_request(line) {
            Ok(req) => req,
            Err(e) => {
                let message = e.to_string();
                let code = if message.starts_with("unknown method") {
                    error_codes::UNKNOWN_METHOD
                } else {
                    error_codes::PARSE_ERROR
                };
                return protocol::format_error("unknown", code, &message);
            }
        };
        self.dispatch(request)
    }

    fn dispatch(&self, request: Request) -> String {
        let id = request.id.clone();
        match request.method {
            Method::RequestInsight => {
                let params: protocol::RequestInsightParams =
                    match serde_json::from_value(request.params) {
                        Ok(p) => p,
                        Err(e) => {
                            return protocol::format_error(
                                &id,
                                error_codes::INVALID_PARAMS,
                                &e.to_string(),
                            )
                        }
                    };
                let Some(tab) = params.tab else {
                    return protocol::format_error(
                        &id,
                        error_codes::MISSING_TAB,
                        "request_insight requires a tab in the sender context",
                    );
                };
                let origin_fallback = format!("https://{}", params.domain);
                let accepted = self
                    .orchestrator
                    .request_insight(
                        tab,
                        params.domain,
                        params.path,
                        params.links,
                        origin_fallback,
                    )
                    .map(|handle| {
                        self.polls.insert(tab, handle);
                    })
                    .is_some();
                protocol::format_response(&id, serde_json::json!({ "accepted": accepted }))
            }
            Method::LinksDiscovered => {
                let params: protocol::LinksDiscoveredParams =
                    match serde_json::from_value(request.params) {
                        Ok(p) => p,
                        Err(e) => {
                            return protocol::format_error(
                                &id,
                                error_codes::INVALID_PARAMS,
                                &e.to_string(),
                            )
                        }
                    };
                let Some(tab) = params.tab else {
                    return protocol::format_error(
                        &id,
                        error_codes::MISSING_TAB,
                        "links_discovered requires a tab in the sender context",
                    );
                };
                let count = params.links.len();
                self.tabs.set_links(tab, params.links);
                protocol::format_response(&id, serde_json::json!({ "stored": count }))
            }
            Method::Dismiss => {
                let params: protocol::DismissParams = match serde_json::from_value(request.params) {
                    Ok(p) => p,
                    Err(e) => {
                        return protocol::format_error(
                            &id,
                            error_codes::INVALID_PARAMS,
                            &e.to_string(),
                        )
                    }
                };
                let Some(tab) = params.tab else {
                    return protocol::format_error(
                        &id,
                        error_codes::MISSING_TAB,
                        "dismiss requires a tab in the sender context",
                    );
                };
                self.dismiss(tab);
                protocol::format_response(&id, serde_json::json!({ "dismissed": true }))
            }
            Method::Snooze => {
                let params: protocol::SnoozeParams = match serde_json::from_value(request.params) {
                    Ok(p) => p,
                    Err(e) => {
                        return protocol::format_error(
                            &id,
                            error_codes::INVALID_PARAMS,
                            &e.to_string(),
                        )
                    }
                };
                self.snooze(&params.domain, params.minutes);
                protocol::format_response(&id, serde_json::json!({ "snoozed": true }))
            }
            Method::SetTheme => {
                let params: protocol::SetThemeParams = match serde_json::from_value(request.params)
                {
                    Ok(p) => p,
                    Err(e) => {
                        return protocol::format_error(
                            &id,
                            error_codes::INVALID_PARAMS,
                            &e.to_string(),
                        )
                    }
                };
                self.durable.lock().unwrap().set_theme(&params.theme);
                protocol::format_response(&id, serde_json::json!({ "theme": params.theme }))
            }
            Method::OpenDashboard => {
                let tab = request
                    .params
                    .get("tab")
                    .and_then(|t| t.as_u64());
                self.events.emit(SentraEvent::DashboardRequested { tab });
                protocol::format_response(&id, serde_json::json!({ "opened": true }))
            }
            Method::Status => {
                let durable = self.durable.lock().unwrap();
                let status = protocol::StatusResult {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    tabs_tracked: self.tabs.len(),
                    snoozed_origins: durable.snooze_count(),
                    theme: durable.theme().map(String::from),
                };
                drop(durable);
                protocol::format_response(&id, serde_json::to_value(status).unwrap_or_default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn test_config(dir: &std::path::Path) -> EngineConfig {
        EngineConfig {
            backend_base_url: "http://127.0.0.1:9".to_string(),
            data_dir: Some(dir.to_path_buf()),
            poll_interval_ms: 5,
            max_poll_attempts: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_focus_event_surfaces_and_marks_journey() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(test_config(dir.path())).unwrap();

        let page = PageView::parse(
            r#"<html><body>
            <form><h2>Create your account</h2>
            <input type="email" name="email" id="email">
            <input type="password" name="password">
            <button type="submit">Sign up</button></form>
            <a href="/privacy">Privacy Policy</a>
            </body></html>"#,
            "https://example.com/welcome",
        )
        .unwrap();

        let report = engine.handle_page_event(
            1,
            &page,
            &PageEvent::FocusIn {
                target: "#email".to_string(),
            },
        );

        assert!(report.intent.detected);
        assert!(matches!(
            report.surface,
            Some(SurfaceOutcome::Surfaced { needs_fetch: true })
        ));
        assert!(matches!(report.overlay_state, OverlayState::Visible(_)));
        // Discovered links were recorded for the fetch.
        assert_eq!(engine.tabs.links(1).len(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_suppresses_resurfacing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(test_config(dir.path())).unwrap();

        let page = PageView::parse(
            "<html><body><h1>Join free today</h1></body></html>",
            "https://example.com/welcome",
        )
        .unwrap();

        let first = engine.handle_page_event(2, &page, &PageEvent::RouteChange);
        assert!(matches!(first.surface, Some(SurfaceOutcome::Surfaced { .. })));

        engine.dismiss(2);
        assert_eq!(engine.overlay_state(2), OverlayState::Hidden);

        let second = engine.handle_page_event(2, &page, &PageEvent::RouteChange);
        assert_eq!(second.surface, Some(SurfaceOutcome::DismissedThisSession));
    }

    #[tokio::test]
    async fn test_route_change_cancels_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(Engine::new(test_config(dir.path())).unwrap());

        let page = PageView::parse(
            "<html><body><h1>Sign up now</h1></body></html>",
            "https://example.com/signup",
        )
        .unwrap();
        engine.handle_page_event(3, &page, &PageEvent::RouteChange);
        assert!(matches!(engine.overlay_state(3), OverlayState::Visible(_)));

        // Route changes arrive through the navigation observer. Re-reporting
        // the current path is not a change and must not reset anything.
        let observer = engine.navigation_observer(3, "/signup");
        observer.observe("/signup");
        assert!(matches!(engine.overlay_state(3), OverlayState::Visible(_)));

        observer.observe("/pricing");
        assert_eq!(engine.overlay_state(3), OverlayState::Hidden);

        // A late insight for the old path is dropped.
        assert!(!engine.apply_insight(3, "/signup", PrivacyInsight::fallback("example.com")));
    }

    #[tokio::test]
    async fn test_protocol_missing_tab() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(test_config(dir.path())).unwrap();

        let resp = engine.handle_request(
            r#"{"id": "r-9", "method": "request_insight", "params": {"domain": "example.com"}}"#,
        );
        let parsed: Value = serde_json::from_str(resp.trim()).unwrap();
        assert_eq!(parsed["ok"], false);
        assert_eq!(parsed["error"]["code"], "missing_tab");
    }

    #[tokio::test]
    async fn test_protocol_status_and_snooze() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(test_config(dir.path())).unwrap();

        let resp = engine.handle_request(
            r#"{"id": "s-1", "method": "snooze", "params": {"domain": "example.com", "minutes": 10}}"#,
        );
        let parsed: Value = serde_json::from_str(resp.trim()).unwrap();
        assert_eq!(parsed["ok"], true);

        let resp = engine.handle_request(r#"{"id": "s-2", "method": "status"}"#);
        let parsed: Value = serde_json::from_str(resp.trim()).unwrap();
        assert_eq!(parsed["result"]["snoozed_origins"], 1);
    }

    #[tokio::test]
    async fn test_protocol_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(test_config(dir.path())).unwrap();
        let resp = engine.handle_request("{definitely not json");
        let parsed: Value = serde_json::from_str(resp.trim()).unwrap();
        assert_eq!(parsed["ok"], false);
        assert_eq!(parsed["error"]["code"], "parse_error");
    }
}
