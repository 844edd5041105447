// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Analysis backend integration: typed HTTP client, per-tab registry, and
//! the fetch/poll orchestrator.
//!
//! Everything here resolves to a usable [`crate::overlay::insight::
//! PrivacyInsight`] in the end: network errors, malformed bodies, and poll
//! exhaustion all degrade to fallback insights rather than surfacing errors
//! to the page.

pub mod client;
pub mod orchestrator;
pub mod tabs;

use thiserror::Error;

/// Errors internal to the backend integration. Never crosses the protocol
/// boundary; the orchestrator converts every variant into a fallback insight.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),
}
