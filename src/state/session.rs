// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ephemeral per-origin session flags.
//!
//! Flags live in a key-value scope whose lifetime matches the hosting
//! session; the engine never clears them itself. The scope is a trait so
//! hosts can back it with whatever storage the embedding offers, and so
//! tests can inject one that fails. A failing scope is treated as "flag
//! absent" on read and as a no-op on write; restricted frames must never
//! break detection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimal key-value contract for a session-lifetime scope.
pub trait KvScope: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()>;
}

/// In-memory scope, the default for the engine process and for tests.
#[derive(Default)]
pub struct MemoryScope {
    entries: HashMap<String, String>,
}

impl KvScope for MemoryScope {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Per-origin flags, serialized as one JSON blob per hostname.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginFlags {
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub journey_seen_until: Option<DateTime<Utc>>,
}

/// Session flag store over a fallible scope.
pub struct SessionStore {
    scope: Box<dyn KvScope>,
}

impl SessionStore {
    pub fn new(scope: Box<dyn KvScope>) -> Self {
        Self { scope }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryScope::default()))
    }

    fn key(host: &str) -> String {
        format!("session:{host}")
    }

    fn read(&self, host: &str) -> OriginFlags {
        match self.scope.get(&Self::key(host)) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => OriginFlags::default(),
            Err(e) => {
                tracing::debug!("session scope read failed for {host}: {e}");
                OriginFlags::default()
            }
        }
    }

    fn write(&mut self, host: &str, flags: &OriginFlags) {
        let raw = match serde_json::to_string(flags) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        if let Err(e) = self.scope.set(&Self::key(host), raw) {
            tracing::debug!("session scope write failed for {host}: {e}");
        }
    }

    pub fn mark_seen(&mut self, host: &str) {
        let mut flags = self.read(host);
        flags.seen = true;
        self.write(host, &flags);
    }

    pub fn was_seen(&self, host: &str) -> bool {
        self.read(host).seen
    }

    pub fn mark_dismissed(&mut self, host: &str) {
        let mut flags = self.read(host);
        flags.dismissed = true;
        self.write(host, &flags);
    }

    pub fn is_dismissed(&self, host: &str) -> bool {
        self.read(host).dismissed
    }

    /// (Re)open the journey window for an origin: `now + ttl`.
    pub fn renew_journey(&mut self, host: &str, now: DateTime<Utc>, ttl: Duration) {
        let mut flags = self.read(host);
        flags.journey_seen_until = Some(now + ttl);
        self.write(host, &flags);
    }

    /// Whether a journey window is open. An expired window is purged on
    /// read; there is no background sweep.
    pub fn journey_active(&mut self, host: &str, now: DateTime<Utc>) -> bool {
        let mut flags = self.read(host);
        match flags.journey_seen_until {
            Some(until) if until > now => true,
            Some(_) => {
                flags.journey_seen_until = None;
                self.write(host, &flags);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenScope;

    impl KvScope for BrokenScope {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("storage unavailable in this frame")
        }
        fn set(&mut self, _key: &str, _value: String) -> anyhow::Result<()> {
            anyhow::bail!("storage unavailable in this frame")
        }
    }

    #[test]
    fn test_seen_and_dismissed_roundtrip() {
        let mut store = SessionStore::in_memory();
        assert!(!store.was_seen("example.com"));
        store.mark_seen("example.com");
        store.mark_dismissed("example.com");
        assert!(store.was_seen("example.com"));
        assert!(store.is_dismissed("example.com"));
        // Other origins unaffected
        assert!(!store.was_seen("other.com"));
    }

    #[test]
    fn test_journey_window_ttl() {
        let mut store = SessionStore::in_memory();
        let t0 = Utc::now();
        let ttl = Duration::minutes(30);
        store.renew_journey("example.com", t0, ttl);

        assert!(store.journey_active("example.com", t0 + Duration::minutes(29)));
        assert!(!store.journey_active("example.com", t0 + Duration::minutes(31)));
        // Purged on the expired read: active again only after a renew.
        assert!(!store.journey_active("example.com", t0));
    }

    #[test]
    fn test_renew_extends_window() {
        let mut store = SessionStore::in_memory();
        let t0 = Utc::now();
        let ttl = Duration::minutes(30);
        store.renew_journey("example.com", t0, ttl);
        store.renew_journey("example.com", t0 + Duration::minutes(20), ttl);
        assert!(store.journey_active("example.com", t0 + Duration::minutes(45)));
    }

    #[test]
    fn test_broken_scope_reads_as_absent() {
        let mut store = SessionStore::new(Box::new(BrokenScope));
        store.mark_seen("example.com");
        store.mark_dismissed("example.com");
        assert!(!store.was_seen("example.com"));
        assert!(!store.is_dismissed("example.com"));
        assert!(!store.journey_active("example.com", Utc::now()));
    }
}
