// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Intent aggregation: six independent detectors OR-ed into a single
//! "signup intent" verdict, plus the decision whether to surface the overlay
//! now or wait for qualifying focus.
//!
//! The detectors are deliberately independent: none consults another's
//! result, so they can be reordered or disabled without changing the rest.
//! Signal names reported on the event bus: `form`, `page`, `path`, `dialog`,
//! `site_modal`, `journey`.

use crate::detect::keywords::{
    contains_any, FieldPatterns, AUTH_ACTION_KEYWORDS, LOGIN_KEYWORDS, PROVIDER_KEYWORDS,
    SIGNUP_KEYWORDS,
};
use crate::detect::page::{element_text, is_within, PageView};
use crate::detect::scorer::{best_signup_context, dialog_elements, SignupContext};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

/// The page event that triggered an evaluation pass. Targets are CSS
/// selectors resolved against the snapshot.
#[derive(Debug, Clone)]
pub enum PageEvent {
    FocusIn { target: String },
    Input { target: String },
    Click { target: String },
    RouteChange,
}

/// Which detectors fired on a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSignals {
    pub form: bool,
    pub page: bool,
    pub path: bool,
    pub dialog: bool,
    pub site_modal: bool,
    pub recent_journey: bool,
}

impl IntentSignals {
    /// Intent is the OR of all six detectors.
    pub fn any(&self) -> bool {
        self.any_fresh() || self.recent_journey
    }

    /// Any detector other than the journey carry-over. Only fresh signals
    /// renew the journey window; the journey signal never renews itself.
    pub fn any_fresh(&self) -> bool {
        self.form || self.page || self.path || self.dialog || self.site_modal
    }

    /// Names of the fired signals, for events and logging.
    pub fn fired(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (on, name) in [
            (self.form, "form"),
            (self.page, "page"),
            (self.path, "path"),
            (self.dialog, "dialog"),
            (self.site_modal, "site_modal"),
            (self.recent_journey, "journey"),
        ] {
            if on {
                out.push(name.to_string());
            }
        }
        out
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct IntentOutcome {
    /// OR of all signals.
    pub detected: bool,
    pub signals: IntentSignals,
    /// Best-context confidence (0.0 when no candidate existed).
    pub confidence: f64,
    /// Surface the overlay now, vs. keep waiting for qualifying engagement.
    pub surface: bool,
    /// The click fast path fired: the event target was a recognized auth
    /// action. Counts as a fresh signal for journey-window renewal.
    pub auth_click: bool,
}

/// Recompute intent for a page snapshot and trigger event.
///
/// `journey_active` is the caller-supplied sixth signal (a non-expired
/// journey window for this origin); the aggregator itself never touches
/// session state.
pub fn evaluate(page: &PageView, event: &PageEvent, journey_active: bool) -> IntentOutcome {
    evaluate_with_threshold(page, event, journey_active, 3.5)
}

/// [`evaluate`] with an explicit form-confidence threshold.
pub fn evaluate_with_threshold(
    page: &PageView,
    event: &PageEvent,
    journey_active: bool,
    confidence_threshold: f64,
) -> IntentOutcome {
    let patterns = FieldPatterns::new();
    let context = best_signup_context(page, &patterns);
    let dialogs = dialog_elements(page);
    let body = page.body_text_lower();
    let path_match = patterns.signup_path.is_match(page.path());

    let signals = IntentSignals {
        form: context.confidence >= confidence_threshold,
        page: (contains_any(&body, SIGNUP_KEYWORDS) && !contains_any(&body, LOGIN_KEYWORDS))
            || path_match,
        path: path_match,
        dialog: dialogs.iter().any(|d| dialog_signal(d)),
        site_modal: dialogs.iter().any(|d| site_modal_signal(d)),
        recent_journey: journey_active,
    };

    // Fast path: a direct click on an auth action surfaces unconditionally,
    // before any focus gating.
    if let PageEvent::Click { target } = event {
        if let Some(el) = page.select_first(target) {
            if is_auth_action(&el) {
                return IntentOutcome {
                    detected: true,
                    signals,
                    confidence: context.confidence,
                    surface: true,
                    auth_click: true,
                };
            }
        }
    }

    let detected = signals.any();
    let surface = detected && should_surface(page, event, &signals, &context, &dialogs);

    IntentOutcome {
        detected,
        signals,
        confidence: context.confidence,
        surface,
        auth_click: false,
    }
}

/// Dialog-level detection: auth copy plus a federated-provider action.
fn dialog_signal(dialog: &ElementRef<'_>) -> bool {
    let text = element_text(dialog).to_lowercase();
    (contains_any(&text, SIGNUP_KEYWORDS) || contains_any(&text, LOGIN_KEYWORDS))
        && contains_any(&text, PROVIDER_KEYWORDS)
}

/// Narrow carve-out for a large social site's auth wall, whose markup
/// defeats the generic heuristics: the dialog offers "sign up" and either
/// cites its policy documents or embeds an email input. Keyed on DOM shape,
/// not hostname; this is the extensibility point for similar holdouts, not a
/// general mechanism.
fn site_modal_signal(dialog: &ElementRef<'_>) -> bool {
    let text = element_text(dialog).to_lowercase();
    if !text.contains("sign up") {
        return false;
    }
    if text.contains("privacy policy") || text.contains("user agreement") {
        return true;
    }
    let email_sel = Selector::parse(r#"input[type="email"]"#).expect("email selector is valid");
    dialog.select(&email_sel).next().is_some()
}

/// Focus gating. Path- and page-level signals surface immediately; otherwise
/// the focused element must qualify: an editable control inside the matched
/// container, any control inside a dialog-like container, or (for the
/// site-specific modal) anything inside that modal. An active journey window
/// overrides: the user already started this flow.
fn should_surface(
    page: &PageView,
    event: &PageEvent,
    signals: &IntentSignals,
    context: &SignupContext<'_>,
    dialogs: &[ElementRef<'_>],
) -> bool {
    if signals.path || signals.page {
        return true;
    }
    if signals.recent_journey {
        return true;
    }

    let target = match event {
        PageEvent::FocusIn { target } | PageEvent::Input { target } | PageEvent::Click { target } => {
            target.as_str()
        }
        PageEvent::RouteChange => return false,
    };
    let Some(focused) = page.select_first(target) else {
        return false;
    };

    let in_context = context
        .element
        .map(|c| is_within(&focused, &c))
        .unwrap_or(false);
    if is_editable(&focused) && in_context {
        return true;
    }
    if dialogs.iter().any(|d| is_within(&focused, d)) {
        return true;
    }
    false
}

/// Text-entry controls that count as signup engagement.
fn is_editable(el: &ElementRef<'_>) -> bool {
    match el.value().name() {
        "textarea" | "select" => true,
        "input" => !matches!(
            el.value().attr("type"),
            Some("submit") | Some("button") | Some("checkbox") | Some("radio") | Some("hidden")
        ),
        _ => false,
    }
}

/// A button/link whose label reads as a direct auth action.
pub fn is_auth_action(el: &ElementRef<'_>) -> bool {
    let tag = el.value().name();
    let role_button = el.value().attr("role") == Some("button");
    if tag != "button" && tag != "a" && !role_button && tag != "input" {
        return false;
    }

    let label = format!(
        "{} {} {} {}",
        element_text(el),
        el.value().attr("aria-label").unwrap_or(""),
        el.value().attr("value").unwrap_or(""),
        el.value().attr("title").unwrap_or(""),
    )
    .to_lowercase();

    contains_any(&label, AUTH_ACTION_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str, url: &str) -> PageView {
        PageView::parse(html, url).unwrap()
    }

    const SIGNUP_FORM: &str = r#"<html><body>
        <p>Welcome back to the catalog.</p>
        <form id="reg">
        <h2>Create your account</h2>
        <input type="email" name="email" id="email">
        <input type="password" name="password">
        <input type="password" name="confirm_password">
        <button type="submit">Create account</button>
        </form>
        <input type="search" id="unrelated">
        </body></html>"#;

    #[test]
    fn test_focus_inside_form_surfaces() {
        let p = page(SIGNUP_FORM, "https://example.com/welcome");
        let out = evaluate(
            &p,
            &PageEvent::FocusIn {
                target: "#email".to_string(),
            },
            false,
        );
        assert!(out.detected);
        assert!(out.signals.form);
        assert!(out.surface);
    }

    #[test]
    fn test_focus_outside_form_suppressed() {
        // Intent is detected (the form is there) but an unrelated focus must
        // not surface the overlay.
        // Body contains "create your account" → page signal would surface; so
        // craft a body with login copy to keep the page signal off.
        let html = r#"<html><body>
            <p>Sign in to continue browsing.</p>
            <form id="reg">
            <h2>Create your account</h2>
            <input type="email" name="email" id="email">
            <input type="password" name="password">
            <input type="password" name="confirm_password">
            <button type="submit">Create account</button>
            </form>
            <input type="search" id="unrelated">
            </body></html>"#;
        let p = page(html, "https://example.com/welcome");
        let out = evaluate(
            &p,
            &PageEvent::FocusIn {
                target: "#unrelated".to_string(),
            },
            false,
        );
        assert!(out.detected);
        assert!(!out.surface);
    }

    #[test]
    fn test_journey_overrides_focus_gating() {
        let html = r#"<html><body>
            <p>Sign in to continue browsing.</p>
            <form id="reg">
            <h2>Create your account</h2>
            <input type="email" name="email">
            <input type="password" name="password">
            <input type="password" name="confirm_password">
            <button type="submit">Create account</button>
            </form>
            <input type="search" id="unrelated">
            </body></html>"#;
        let p = page(html, "https://example.com/welcome");
        let out = evaluate(
            &p,
            &PageEvent::FocusIn {
                target: "#unrelated".to_string(),
            },
            true,
        );
        assert!(out.signals.recent_journey);
        assert!(out.surface);
    }

    #[test]
    fn test_path_signal_surfaces_without_focus() {
        let p = page("<html><body><p>Loading…</p></body></html>", "https://example.com/signup");
        let out = evaluate(&p, &PageEvent::RouteChange, false);
        assert!(out.detected);
        assert!(out.signals.path);
        assert!(out.signals.page); // path match folds into the page signal
        assert!(out.surface);
    }

    #[test]
    fn test_page_text_signal() {
        let p = page(
            "<html><body><h1>Join free and get started today</h1></body></html>",
            "https://example.com/welcome",
        );
        let out = evaluate(&p, &PageEvent::RouteChange, false);
        assert!(out.signals.page);
        assert!(!out.signals.path);
        assert!(out.surface);
    }

    #[test]
    fn test_page_text_signal_muted_by_login_copy() {
        let p = page(
            "<html><body><h1>Join free</h1><p>or sign in</p></body></html>",
            "https://example.com/welcome",
        );
        let out = evaluate(&p, &PageEvent::RouteChange, false);
        assert!(!out.signals.page);
    }

    #[test]
    fn test_dialog_signal_with_provider_action() {
        let html = r#"<html><body>
            <div role="dialog" id="d">
            <p>Sign in to your workspace</p>
            <button id="google">Continue with Google</button>
            </div>
            </body></html>"#;
        let p = page(html, "https://example.com/doc");
        let out = evaluate(
            &p,
            &PageEvent::FocusIn {
                target: "#google".to_string(),
            },
            false,
        );
        assert!(out.signals.dialog);
        assert!(out.detected);
        // Focused control inside the dialog qualifies.
        assert!(out.surface);
    }

    #[test]
    fn test_site_modal_carve_out() {
        let html = r#"<html><body>
            <div aria-modal="true" id="m">
            <h2>Sign up</h2>
            <p>By continuing, you agree to our User Agreement.</p>
            <input id="inner" type="text" name="username">
            </div>
            </body></html>"#;
        let p = page(html, "https://example.com/feed");
        let out = evaluate(
            &p,
            &PageEvent::FocusIn {
                target: "#inner".to_string(),
            },
            false,
        );
        assert!(out.signals.site_modal);
        assert!(out.surface);
    }

    #[test]
    fn test_auth_click_fast_path() {
        // No form, no signup path. Only a bare button.
        let html = r#"<html><body>
            <button id="cta">Sign up</button>
            </body></html>"#;
        let p = page(html, "https://example.com/welcome");
        let out = evaluate(
            &p,
            &PageEvent::Click {
                target: "#cta".to_string(),
            },
            false,
        );
        assert!(out.detected);
        assert!(out.surface);
    }

    #[test]
    fn test_non_auth_click_does_not_fast_path() {
        let html = r#"<html><body>
            <button id="cta">Add to cart</button>
            </body></html>"#;
        let p = page(html, "https://example.com/product");
        let out = evaluate(
            &p,
            &PageEvent::Click {
                target: "#cta".to_string(),
            },
            false,
        );
        assert!(!out.detected);
        assert!(!out.surface);
    }

    #[test]
    fn test_is_auth_action_variants() {
        let html = r#"<html><body>
            <a id="a1" href="/signup">Create account</a>
            <div id="a2" role="button" aria-label="Continue with Apple"></div>
            <span id="no">Create account</span>
            </body></html>"#;
        let p = page(html, "https://example.com/");
        assert!(is_auth_action(&p.select_first("#a1").unwrap()));
        assert!(is_auth_action(&p.select_first("#a2").unwrap()));
        assert!(!is_auth_action(&p.select_first("#no").unwrap()));
    }

    #[test]
    fn test_signal_names() {
        let signals = IntentSignals {
            path: true,
            recent_journey: true,
            ..Default::default()
        };
        assert_eq!(signals.fired(), vec!["path", "journey"]);
        assert!(signals.any());
        assert!(signals.any_fresh());

        let journey_only = IntentSignals {
            recent_journey: true,
            ..Default::default()
        };
        assert!(journey_only.any());
        assert!(!journey_only.any_fresh());
    }
}
