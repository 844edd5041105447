// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Overlay lifecycle state machine.
//!
//! `Hidden → Visible(Loading) → Visible(Ready) → Hidden`, driven by surface
//! decisions from the intent aggregator, dismissals, route changes, and
//! asynchronously arriving insights. An insight can land after the user has
//! dismissed or navigated away; such stale updates are dropped by comparing
//! against the current path and visibility, never rendered.

use crate::overlay::insight::PrivacyInsight;
use crate::state::durable::DurableStore;
use crate::state::session::SessionStore;
use chrono::{DateTime, Utc};

/// Visible-overlay phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Loading,
    Ready,
}

/// Overlay visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Hidden,
    Visible(OverlayPhase),
}

/// Why a surface request did not surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOutcome {
    /// Transitioned to `Visible(Loading)`; the caller should start a fetch
    /// unless one already ran for this path.
    Surfaced { needs_fetch: bool },
    AlreadyVisible,
    DismissedThisSession,
    Snoozed,
}

/// Per-tab overlay controller.
pub struct OverlayController {
    host: String,
    path: String,
    state: OverlayState,
    insight: Option<PrivacyInsight>,
    /// A fetch already ran for the current path; surfacing again must not
    /// re-trigger it.
    fetched_for_path: bool,
    /// Testability knob: when false, session seen/dismissed flags are
    /// ignored entirely. Shipped default is true.
    session_suppression: bool,
}

impl OverlayController {
    pub fn new(host: &str, path: &str, session_suppression: bool) -> Self {
        Self {
            host: host.to_string(),
            path: path.to_string(),
            state: OverlayState::Hidden,
            insight: None,
            fetched_for_path: false,
            session_suppression,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The insight currently backing the overlay (placeholder while loading).
    pub fn insight(&self) -> Option<&PrivacyInsight> {
        self.insight.as_ref()
    }

    /// Handle a "surface now" decision from the aggregator.
    pub fn request_surface(
        &mut self,
        session: &mut SessionStore,
        durable: &mut DurableStore,
        now: DateTime<Utc>,
    ) -> SurfaceOutcome {
        if matches!(self.state, OverlayState::Visible(_)) {
            return SurfaceOutcome::AlreadyVisible;
        }
        if self.session_suppression && session.is_dismissed(&self.host) {
            return SurfaceOutcome::DismissedThisSession;
        }
        if durable.is_snoozed(&self.host, now) {
            return SurfaceOutcome::Snoozed;
        }

        self.state = OverlayState::Visible(OverlayPhase::Loading);
        self.insight = Some(PrivacyInsight::placeholder(&self.host));
        if self.session_suppression {
            session.mark_seen(&self.host);
        }

        let needs_fetch = !self.fetched_for_path;
        self.fetched_for_path = true;
        SurfaceOutcome::Surfaced { needs_fetch }
    }

    /// Apply an asynchronously delivered insight. Returns false if the
    /// update was stale (old path, or overlay no longer visible) and was
    /// dropped.
    pub fn apply_insight(&mut self, path: &str, insight: PrivacyInsight) -> bool {
        if path != self.path {
            tracing::debug!(
                "dropping stale insight for {} (current path {})",
                path,
                self.path
            );
            return false;
        }
        if !matches!(self.state, OverlayState::Visible(_)) {
            return false;
        }
        self.state = OverlayState::Visible(OverlayPhase::Ready);
        self.insight = Some(insight);
        true
    }

    /// Explicit dismiss (button, Escape, outside-click).
    pub fn dismiss(&mut self, session: &mut SessionStore) {
        self.state = OverlayState::Hidden;
        if self.session_suppression {
            session.mark_dismissed(&self.host);
        }
    }

    /// A route change resets all per-page state: visibility, insight, and
    /// the fetched-for-path marker. Poll cancellation is the orchestration
    /// layer's half of this reset.
    pub fn on_route_change(&mut self, new_path: &str) {
        self.path = new_path.to_string();
        self.state = OverlayState::Hidden;
        self.insight = None;
        self.fetched_for_path = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn setup() -> (OverlayController, SessionStore, DurableStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let controller = OverlayController::new("example.com", "/signup", true);
        let session = SessionStore::in_memory();
        let durable = DurableStore::open(dir.path()).unwrap();
        (controller, session, durable, dir)
    }

    #[test]
    fn test_surface_then_ready() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();

        let outcome = c.request_surface(&mut session, &mut durable, now);
        assert_eq!(outcome, SurfaceOutcome::Surfaced { needs_fetch: true });
        assert_eq!(c.state(), OverlayState::Visible(OverlayPhase::Loading));
        assert!(c.insight().is_some());
        assert!(session.was_seen("example.com"));

        assert!(c.apply_insight("/signup", PrivacyInsight::fallback("example.com")));
        assert_eq!(c.state(), OverlayState::Visible(OverlayPhase::Ready));
    }

    #[test]
    fn test_second_surface_is_noop() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();
        c.request_surface(&mut session, &mut durable, now);
        assert_eq!(
            c.request_surface(&mut session, &mut durable, now),
            SurfaceOutcome::AlreadyVisible
        );
    }

    #[test]
    fn test_dismissal_suppresses_for_session() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();
        c.request_surface(&mut session, &mut durable, now);
        c.dismiss(&mut session);
        assert_eq!(c.state(), OverlayState::Hidden);
        assert_eq!(
            c.request_surface(&mut session, &mut durable, now),
            SurfaceOutcome::DismissedThisSession
        );
    }

    #[test]
    fn test_suppression_knob_disables_dismissal_gating() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = OverlayController::new("example.com", "/signup", false);
        let mut session = SessionStore::in_memory();
        let mut durable = DurableStore::open(dir.path()).unwrap();
        let now = Utc::now();

        c.request_surface(&mut session, &mut durable, now);
        c.dismiss(&mut session);
        // With suppression off the dismissal is not recorded, and surfacing
        // works again immediately.
        assert!(matches!(
            c.request_surface(&mut session, &mut durable, now),
            SurfaceOutcome::Surfaced { .. }
        ));
    }

    #[test]
    fn test_snooze_gates_surfacing() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();
        durable.snooze("example.com", now + Duration::minutes(10));
        assert_eq!(
            c.request_surface(&mut session, &mut durable, now),
            SurfaceOutcome::Snoozed
        );
        // After the window the same request surfaces.
        assert!(matches!(
            c.request_surface(&mut session, &mut durable, now + Duration::minutes(11)),
            SurfaceOutcome::Surfaced { .. }
        ));
    }

    #[test]
    fn test_stale_insight_for_old_path_dropped() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();
        c.request_surface(&mut session, &mut durable, now);

        c.on_route_change("/welcome");
        // The late result for the old path must not render.
        assert!(!c.apply_insight("/signup", PrivacyInsight::fallback("example.com")));
        assert_eq!(c.state(), OverlayState::Hidden);
        assert!(c.insight().is_none());
    }

    #[test]
    fn test_insight_after_dismiss_dropped() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();
        c.request_surface(&mut session, &mut durable, now);
        c.dismiss(&mut session);
        assert!(!c.apply_insight("/signup", PrivacyInsight::fallback("example.com")));
        assert_eq!(c.state(), OverlayState::Hidden);
    }

    #[test]
    fn test_route_change_clears_fetch_marker() {
        let (mut c, mut session, mut durable, _dir) = setup();
        let now = Utc::now();

        let first = c.request_surface(&mut session, &mut durable, now);
        assert_eq!(first, SurfaceOutcome::Surfaced { needs_fetch: true });

        c.on_route_change("/signup/step2");
        let second = c.request_surface(&mut session, &mut durable, now);
        // New path: a fresh fetch is required again.
        assert_eq!(second, SurfaceOutcome::Surfaced { needs_fetch: true });
    }
}
