// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration.
//!
//! Every tunable the detection heuristics and the poll orchestrator depend on
//! lives here, with defaults matching the shipped behavior. A JSON config
//! file can override any subset of fields; everything else falls back to the
//! defaults via serde.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for the detection engine and backend orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the analysis backend (no trailing slash).
    pub backend_base_url: String,
    /// Scorer confidence at or above which form-based intent is detected.
    pub confidence_threshold: f64,
    /// How long a detected signup journey keeps counting as intent, minutes.
    pub journey_ttl_minutes: i64,
    /// Delay between poll attempts while the backend answers 202, millis.
    pub poll_interval_ms: u64,
    /// Maximum poll attempts before giving up with a fallback insight.
    pub max_poll_attempts: u32,
    /// Per-request HTTP timeout, millis.
    pub request_timeout_ms: u64,
    /// When false, session seen/dismissed flags never suppress surfacing.
    /// Testability knob; the shipped default is true.
    pub session_suppression: bool,
    /// Directory for durable state (snooze map, theme). `None` = ~/.sentra.
    pub data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend_base_url: "http://127.0.0.1:8000/api".to_string(),
            confidence_threshold: 3.5,
            journey_ttl_minutes: 30,
            poll_interval_ms: 2_500,
            max_poll_attempts: 15,
            request_timeout_ms: 10_000,
            session_suppression: true,
            data_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file, falling back to defaults for any
    /// missing field.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolved durable-state directory (~/.sentra unless overridden).
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".sentra")
        })
    }

    /// Poll delay as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Journey TTL as a chrono duration.
    pub fn journey_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.journey_ttl_minutes)
    }
}
