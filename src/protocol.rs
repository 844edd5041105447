// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Protocol message parsing and formatting for the Sentra message surface.
//!
//! Messages are newline-delimited JSON. A request carries `{id, method,
//! params}`; the engine answers synchronously with `{id, ok, result|error}`
//! and delivers asynchronous results ("insight ready" for an earlier
//! `request_insight`) as push messages tagged with `event`. Nothing here
//! throws across the boundary; malformed requests and missing context come
//! back as structured errors.

use crate::detect::links::PolicyLink;
use crate::events::{SentraEvent, TabId};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes reported in structured error responses.
pub mod error_codes {
    pub const PARSE_ERROR: &str = "parse_error";
    pub const UNKNOWN_METHOD: &str = "unknown_method";
    pub const INVALID_PARAMS: &str = "invalid_params";
    /// The request requires a tab/sender context that was not supplied.
    pub const MISSING_TAB: &str = "missing_tab";
    pub const INTERNAL: &str = "internal";
}

/// Methods supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Request a privacy insight for a tab (ack now, push result later).
    RequestInsight,
    /// Report policy links discovered on a tab's page.
    LinksDiscovered,
    /// Dismiss the overlay for a tab.
    Dismiss,
    /// Snooze an origin for a number of minutes.
    Snooze,
    /// Persist the user theme preference.
    SetTheme,
    /// Open the dashboard / side panel.
    OpenDashboard,
    /// Engine status.
    Status,
}

impl Method {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "request_insight" => Ok(Self::RequestInsight),
            "links_discovered" => Ok(Self::LinksDiscovered),
            "dismiss" => Ok(Self::Dismiss),
            "snooze" => Ok(Self::Snooze),
            "set_theme" => Ok(Self::SetTheme),
            "open_dashboard" => Ok(Self::OpenDashboard),
            "status" => Ok(Self::Status),
            _ => bail!("unknown method: {s}"),
        }
    }
}

/// A parsed protocol request.
#[derive(Debug)]
pub struct Request {
    pub id: String,
    pub method: Method,
    pub params: Value,
}

/// Parse a JSON request line. Requests without an id get a generated one so
/// the error response can still be correlated by the sender's logs.
pub fn parse_request(json: &str) -> Result<Request> {
    let v: Value = serde_json::from_str(json)?;

    let id = v
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method_str = v
        .get("method")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing 'method' field"))?;
    let method = Method::parse(method_str)?;

    let params = v.get("params").cloned().unwrap_or(Value::Object(Default::default()));

    Ok(Request { id, method, params })
}

/// Format a successful response (newline-terminated).
pub fn format_response(id: &str, result: Value) -> String {
    let resp = serde_json::json!({
        "id": id,
        "ok": true,
        "result": result,
    });
    format!("{resp}\n")
}

/// Format a structured error response (newline-terminated).
pub fn format_error(id: &str, code: &str, message: &str) -> String {
    let resp = serde_json::json!({
        "id": id,
        "ok": false,
        "error": {
            "code": code,
            "message": message,
        },
    });
    format!("{resp}\n")
}

/// Format an asynchronous push message (newline-terminated).
pub fn format_push(event: &SentraEvent) -> String {
    let resp = serde_json::json!({
        "event": event,
    });
    format!("{resp}\n")
}

// ── Typed params ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RequestInsightParams {
    pub tab: Option<TabId>,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub links: Vec<String>,
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LinksDiscoveredParams {
    pub tab: Option<TabId>,
    pub links: Vec<PolicyLink>,
}

#[derive(Debug, Deserialize)]
pub struct DismissParams {
    pub tab: Option<TabId>,
}

#[derive(Debug, Deserialize)]
pub struct SnoozeParams {
    pub domain: String,
    pub minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetThemeParams {
    pub theme: String,
}

/// Status snapshot returned by the `status` method.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResult {
    pub version: String,
    pub tabs_tracked: usize,
    pub snoozed_origins: usize,
    pub theme: Option<String>,
}
