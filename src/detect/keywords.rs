// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Keyword sets, field-identifier patterns, and scoring weights.
//!
//! The weights are ad-hoc additive constants tuned against real signup
//! pages. They are deliberately kept in one place so they can be adjusted
//! and table-tested independently of the scoring walk.

use regex::Regex;

// ── Scoring weights ──────────────────────────────────────────────────────────

/// Candidate text contains a signup keyword (and no login keyword).
pub const W_TEXT_SIGNUP: f64 = 3.0;
/// Candidate text contains a login keyword and no signup keyword.
pub const W_TEXT_LOGIN_ONLY: f64 = -2.0;
/// Candidate text contains both. Login text dilutes signup confidence even
/// when a signup keyword is present; the asymmetry with `W_TEXT_LOGIN_ONLY`
/// is intentional and must not be normalized.
pub const W_TEXT_MIXED: f64 = -0.5;
/// Candidate is a dialog-like container.
pub const W_DIALOG_LIKE: f64 = 1.0;
/// Candidate has a full-name field.
pub const W_FIELD_NAME: f64 = 1.0;
/// Candidate has a phone field.
pub const W_FIELD_PHONE: f64 = 0.5;
/// Candidate has an email field.
pub const W_FIELD_EMAIL: f64 = 1.5;
/// Candidate has a password field.
pub const W_FIELD_PASSWORD: f64 = 1.5;
/// Candidate has a confirm/repeat-password field.
pub const W_FIELD_CONFIRM: f64 = 1.5;
/// Candidate has a submit-type button labeled with a signup keyword.
pub const W_SUBMIT_SIGNUP: f64 = 2.0;
/// Early-step wizard bonus: signup keyword + name field + no password field
/// + a next/continue button. Catches multi-step flows where the password
/// field only appears on a later step.
pub const W_EARLY_STEP: f64 = 1.5;

// ── Keyword sets ─────────────────────────────────────────────────────────────

/// Phrases that mark account-creation copy. Matched against lowercased text.
pub const SIGNUP_KEYWORDS: &[&str] = &[
    "sign up",
    "signup",
    "register",
    "create account",
    "create your account",
    "create an account",
    "join",
    "get started",
];

/// Phrases that mark login copy.
pub const LOGIN_KEYWORDS: &[&str] = &["sign in", "signin", "log in", "login"];

/// Federated-auth provider actions referenced by dialog-level detection.
pub const PROVIDER_KEYWORDS: &[&str] = &["continue with", "google", "apple"];

/// Labels that mark an element as a direct auth action (the click fast path).
pub const AUTH_ACTION_KEYWORDS: &[&str] = &[
    "sign up",
    "signup",
    "sign in",
    "log in",
    "register",
    "create account",
    "continue with",
    "google",
    "apple",
    "email",
];

/// Button labels that advance a multi-step wizard.
pub const NEXT_STEP_KEYWORDS: &[&str] = &["next", "continue"];

/// Anchor text/href/title fragments that mark policy and terms documents.
pub const POLICY_LINK_KEYWORDS: &[&str] = &[
    "terms of service",
    "terms of use",
    "terms and conditions",
    "terms",
    "privacy policy",
    "privacy",
    "cookie policy",
    "user agreement",
    "legal",
    "eula",
];

/// Selectors that mark dialog-like containers. Substring class/testid
/// heuristics cover component libraries that skip ARIA roles.
pub const DIALOG_SELECTORS: &[&str] = &[
    r#"[role="dialog"]"#,
    r#"[aria-modal="true"]"#,
    r#"[data-testid*="modal"]"#,
    r#"[data-testid*="dialog"]"#,
    r#"[class*="modal"]"#,
    r#"[class*="Modal"]"#,
    r#"[class*="dialog"]"#,
    r#"[class*="popup"]"#,
];

// ── Compiled patterns ────────────────────────────────────────────────────────

/// URL path shapes that indicate a signup route.
pub const SIGNUP_PATH_PATTERN: &str = r"(?i)sign.?up|register|create.?account|accounts?/signup";

/// Field-identifier regexes, compiled once per evaluation pass and shared by
/// every candidate the scorer examines.
pub struct FieldPatterns {
    pub full_name: Regex,
    pub phone: Regex,
    pub email: Regex,
    pub password: Regex,
    pub confirm_password: Regex,
    pub signup_path: Regex,
}

impl FieldPatterns {
    pub fn new() -> Self {
        // Patterns match against the concatenated name/id/placeholder/type of
        // a field, already lowercased.
        Self {
            full_name: Regex::new(r"(full.?name|first.?name|last.?name|\bname\b)")
                .expect("name pattern is valid"),
            phone: Regex::new(r"(phone|mobile|\btel\b)").expect("phone pattern is valid"),
            email: Regex::new(r"e.?mail").expect("email pattern is valid"),
            password: Regex::new(r"passw(or)?d").expect("password pattern is valid"),
            confirm_password: Regex::new(
                r"(confirm|repeat|verify|re.?enter).{0,12}passw|passw(or)?d.{0,12}(confirm|again|2\b)",
            )
            .expect("confirm pattern is valid"),
            signup_path: Regex::new(SIGNUP_PATH_PATTERN).expect("path pattern is valid"),
        }
    }
}

/// True if `text` (lowercased by the caller) contains any of `keywords`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_any() {
        assert!(contains_any("please sign up here", SIGNUP_KEYWORDS));
        assert!(contains_any("log in to continue", LOGIN_KEYWORDS));
        assert!(!contains_any("browse our catalog", SIGNUP_KEYWORDS));
    }

    #[test]
    fn test_field_patterns() {
        let p = FieldPatterns::new();
        assert!(p.full_name.is_match("full_name"));
        assert!(p.full_name.is_match("firstname"));
        assert!(p.full_name.is_match("your name"));
        assert!(!p.full_name.is_match("username_handle"));
        assert!(p.email.is_match("email"));
        assert!(p.email.is_match("e-mail address"));
        assert!(p.phone.is_match("mobile_number"));
        assert!(p.password.is_match("passwd"));
        assert!(p.confirm_password.is_match("confirm_password"));
        assert!(p.confirm_password.is_match("password_again"));
        assert!(p.confirm_password.is_match("repeat password"));
        assert!(!p.confirm_password.is_match("password"));
    }

    #[test]
    fn test_signup_path_pattern() {
        let p = FieldPatterns::new();
        assert!(p.signup_path.is_match("/signup"));
        assert!(p.signup_path.is_match("/sign-up"));
        assert!(p.signup_path.is_match("/register"));
        assert!(p.signup_path.is_match("/accounts/signup"));
        assert!(p.signup_path.is_match("/create-account"));
        assert!(!p.signup_path.is_match("/pricing"));
    }
}
