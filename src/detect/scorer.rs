// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Signup context scorer.
//!
//! Candidates are every `<form>` plus every dialog-like container, scored
//! with independent signed contributions (keywords, field identifiers,
//! submit labels). The candidate with the strictly highest score wins; ties
//! keep the first examined in document order. Scores are recomputed from
//! scratch on every evaluation pass; nothing here is cached between events.

use crate::detect::keywords::{
    self, contains_any, FieldPatterns, DIALOG_SELECTORS, LOGIN_KEYWORDS, NEXT_STEP_KEYWORDS,
    SIGNUP_KEYWORDS,
};
use crate::detect::page::{element_text, PageView};
use scraper::{ElementRef, Selector};
use std::collections::HashSet;

/// The best-scoring signup-context candidate for a page.
///
/// `element` is `None` for the zero-confidence empty result returned when a
/// page has no candidates at all.
pub struct SignupContext<'doc> {
    pub element: Option<ElementRef<'doc>>,
    pub confidence: f64,
    pub is_dialog_like: bool,
}

impl SignupContext<'_> {
    fn empty() -> Self {
        Self {
            element: None,
            confidence: 0.0,
            is_dialog_like: false,
        }
    }
}

/// Find the single best-scoring signup context on a page.
pub fn best_signup_context<'doc>(
    page: &'doc PageView,
    patterns: &FieldPatterns,
) -> SignupContext<'doc> {
    let mut best = SignupContext::empty();
    let mut seen: HashSet<_> = HashSet::new();

    for (candidate, dialog_like) in candidates(page) {
        if !seen.insert(candidate.id()) {
            continue;
        }
        let score = score_candidate(&candidate, dialog_like, patterns);
        // Strictly-greater keeps the first examined on ties.
        if best.element.is_none() || score > best.confidence {
            best = SignupContext {
                element: Some(candidate),
                confidence: score,
                is_dialog_like: dialog_like,
            };
        }
    }

    best
}

/// Candidate containers in examination order: forms first (document order),
/// then dialog-like containers per selector.
fn candidates<'doc>(page: &'doc PageView) -> Vec<(ElementRef<'doc>, bool)> {
    let mut out = Vec::new();

    let form_sel = Selector::parse("form").expect("form selector is valid");
    for form in page.document().select(&form_sel) {
        out.push((form, false));
    }

    for css in DIALOG_SELECTORS {
        if let Ok(sel) = Selector::parse(css) {
            for el in page.document().select(&sel) {
                out.push((el, true));
            }
        }
    }

    out
}

/// Every dialog-like container on the page, deduplicated, in selector order.
/// Used by dialog-level intent detection and by focus gating (is the focused
/// element inside one of these?).
pub fn dialog_elements<'doc>(page: &'doc PageView) -> Vec<ElementRef<'doc>> {
    let mut seen: HashSet<_> = HashSet::new();
    let mut out = Vec::new();
    for css in DIALOG_SELECTORS {
        if let Ok(sel) = Selector::parse(css) {
            for el in page.document().select(&sel) {
                if seen.insert(el.id()) {
                    out.push(el);
                }
            }
        }
    }
    out
}

/// Score one candidate container. Pure function over the candidate subtree;
/// the weights live in [`crate::detect::keywords`].
pub fn score_candidate(
    candidate: &ElementRef<'_>,
    dialog_like: bool,
    patterns: &FieldPatterns,
) -> f64 {
    let mut score = 0.0;

    let text = element_text(candidate).to_lowercase();
    let has_signup = contains_any(&text, SIGNUP_KEYWORDS);
    let has_login = contains_any(&text, LOGIN_KEYWORDS);
    score += match (has_signup, has_login) {
        (true, false) => keywords::W_TEXT_SIGNUP,
        (false, true) => keywords::W_TEXT_LOGIN_ONLY,
        (true, true) => keywords::W_TEXT_MIXED,
        (false, false) => 0.0,
    };

    if dialog_like {
        score += keywords::W_DIALOG_LIKE;
    }

    let fields = field_flags(candidate, patterns);
    if fields.name {
        score += keywords::W_FIELD_NAME;
    }
    if fields.phone {
        score += keywords::W_FIELD_PHONE;
    }
    if fields.email {
        score += keywords::W_FIELD_EMAIL;
    }
    if fields.password {
        score += keywords::W_FIELD_PASSWORD;
    }
    if fields.confirm {
        score += keywords::W_FIELD_CONFIRM;
    }

    let buttons = button_flags(candidate);
    if buttons.submit_signup {
        score += keywords::W_SUBMIT_SIGNUP;
    }

    if has_signup && fields.name && !fields.password && buttons.next_step {
        score += keywords::W_EARLY_STEP;
    }

    score
}

#[derive(Default)]
struct FieldFlags {
    name: bool,
    phone: bool,
    email: bool,
    password: bool,
    confirm: bool,
}

/// Which field kinds the candidate contains, judged from each field's
/// name/id/placeholder/type.
fn field_flags(candidate: &ElementRef<'_>, patterns: &FieldPatterns) -> FieldFlags {
    let field_sel = Selector::parse("input, select, textarea").expect("field selector is valid");
    let mut flags = FieldFlags::default();

    for field in candidate.select(&field_sel) {
        let v = field.value();
        let ident = format!(
            "{} {} {} {}",
            v.attr("name").unwrap_or(""),
            v.attr("id").unwrap_or(""),
            v.attr("placeholder").unwrap_or(""),
            v.attr("type").unwrap_or(""),
        )
        .to_lowercase();

        let is_confirm = patterns.confirm_password.is_match(&ident);
        flags.confirm |= is_confirm;
        // A confirm field should not satisfy the base password signal on its
        // own; the wizard early-step check depends on the distinction.
        flags.password |= patterns.password.is_match(&ident) && !is_confirm;
        flags.email |= patterns.email.is_match(&ident);
        flags.phone |= patterns.phone.is_match(&ident);
        flags.name |= patterns.full_name.is_match(&ident);
    }

    flags
}

#[derive(Default)]
struct ButtonFlags {
    submit_signup: bool,
    next_step: bool,
}

fn button_flags(candidate: &ElementRef<'_>) -> ButtonFlags {
    let button_sel = Selector::parse(r#"button, input[type="submit"], input[type="button"]"#)
        .expect("button selector is valid");
    let mut flags = ButtonFlags::default();

    for button in candidate.select(&button_sel) {
        let label = button
            .value()
            .attr("value")
            .map(String::from)
            .unwrap_or_else(|| element_text(&button))
            .to_lowercase();
        if label.is_empty() {
            continue;
        }

        // <button> defaults to type=submit inside a form.
        let is_submit = matches!(
            button.value().attr("type"),
            Some("submit") | None
        );
        if is_submit && contains_any(&label, SIGNUP_KEYWORDS) {
            flags.submit_signup = true;
        }
        if contains_any(&label, NEXT_STEP_KEYWORDS) {
            flags.next_step = true;
        }
    }

    flags
}
