// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Durable per-origin snoozes and user preferences.
//!
//! A single JSON file under the data dir holds the snooze map
//! (hostname → expiry epoch-millis) and the theme preference. Expired
//! snoozes are evicted lazily when read; there is no background sweep.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const STORE_FILE: &str = "store.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DurableState {
    /// hostname → snooze expiry, epoch millis.
    #[serde(default)]
    snoozes: HashMap<String, i64>,
    #[serde(default)]
    theme: Option<String>,
}

/// File-backed durable store.
pub struct DurableStore {
    path: PathBuf,
    state: DurableState,
}

impl DurableStore {
    /// Open (or create) the store under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create data dir: {}", dir.display()))?;
        let path = dir.join(STORE_FILE);

        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => DurableState::default(),
        };

        Ok(Self { path, state })
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.state) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    tracing::warn!("failed to persist durable store: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to serialize durable store: {e}"),
        }
    }

    /// Snooze an origin until `until`.
    pub fn snooze(&mut self, host: &str, until: DateTime<Utc>) {
        self.state
            .snoozes
            .insert(host.to_string(), until.timestamp_millis());
        self.persist();
    }

    /// Whether an origin is snoozed at `now`. An expired entry is removed
    /// and reported as not snoozed.
    pub fn is_snoozed(&mut self, host: &str, now: DateTime<Utc>) -> bool {
        match self.state.snoozes.get(host) {
            Some(&expiry) if expiry > now.timestamp_millis() => true,
            Some(_) => {
                self.state.snoozes.remove(host);
                self.persist();
                false
            }
            None => false,
        }
    }

    /// Number of snooze entries currently held (including expired ones not
    /// yet read).
    pub fn snooze_count(&self) -> usize {
        self.state.snoozes.len()
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.state.theme = Some(theme.to_string());
        self.persist();
    }

    pub fn theme(&self) -> Option<&str> {
        self.state.theme.as_deref()
    }
}
