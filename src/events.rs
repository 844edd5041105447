// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sentra event bus — typed events from every component.
//!
//! The bus is a `tokio::sync::broadcast` channel carrying [`SentraEvent`]
//! values. Any consumer (the protocol surface, the overlay dispatcher, log
//! sinks) subscribes independently. When no subscribers exist, events are
//! silently dropped (zero overhead). This is also how the fetch orchestrator
//! pushes an unsolicited "result ready" update to a page whose overlay is
//! still in its loading phase.

use crate::overlay::insight::PrivacyInsight;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tab identifier as assigned by the host (browser tab id or harness index).
pub type TabId = u64;

/// Every event Sentra emits. Serialized to JSON for protocol push messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SentraEvent {
    // ── Detection ─────────────────────────
    /// Signup intent fired for an origin; `signals` names the detectors.
    IntentDetected {
        host: String,
        path: String,
        signals: Vec<String>,
        confidence: f64,
    },

    // ── Overlay lifecycle ─────────────────
    /// The overlay became visible in its loading phase.
    OverlaySurfaced { tab: TabId, host: String, path: String },
    /// The overlay was dismissed by the user.
    OverlayDismissed { tab: TabId, host: String },

    // ── Backend fetch ─────────────────────
    /// An analysis fetch was started for a tab.
    FetchStarted { tab: TabId, domain: String },
    /// A resolved insight is ready for a tab (direct result or late push).
    InsightReady {
        tab: TabId,
        domain: String,
        path: String,
        insight: PrivacyInsight,
    },
    /// The poll loop gave up after the bounded attempt count.
    PollExhausted { tab: TabId, domain: String, attempts: u32 },
    /// A fetch failed terminally; a fallback insight was delivered instead.
    FetchFailed { tab: TabId, domain: String, error: String },

    // ── Host requests ─────────────────────
    /// The host asked to open the dashboard / side panel.
    DashboardRequested { tab: Option<TabId> },
    /// A tab closed; its cached analysis state was torn down.
    TabClosed { tab: TabId },
}

/// The central event bus.
pub struct EventBus {
    sender: broadcast::Sender<SentraEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: SentraEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SentraEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SentraEvent::IntentDetected {
            host: "example.com".to_string(),
            path: "/signup".to_string(),
            signals: vec!["path".to_string()],
            confidence: 5.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("IntentDetected"));
        assert!(json.contains("example.com"));

        let parsed: SentraEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            SentraEvent::IntentDetected { host, .. } => assert_eq!(host, "example.com"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.emit(SentraEvent::TabClosed { tab: 7 });
    }

    #[test]
    fn test_subscribe_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(SentraEvent::DashboardRequested { tab: Some(1) });

        match rx.try_recv().unwrap() {
            SentraEvent::DashboardRequested { tab } => assert_eq!(tab, Some(1)),
            _ => panic!("wrong event"),
        }
    }

    #[test]
    fn test_async_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.emit(SentraEvent::TabClosed { tab: 42 });

        match tokio_test::block_on(rx.recv()).unwrap() {
            SentraEvent::TabClosed { tab } => assert_eq!(tab, 42),
            _ => panic!("wrong event"),
        }
    }
}
