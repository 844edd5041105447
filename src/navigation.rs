// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

//! Navigation observation.
//!
//! Single-page apps rewrite the location without a page load, so the engine
//! needs a route-change signal independent of document parsing. The observer
//! is the one registration point, `on_route_change(callback)`. It hides
//! how changes are detected: the host may patch history calls, use a native
//! navigation API, or poll the location; it just reports URLs here.

use std::sync::Mutex;

/// A route change as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub path: String,
    pub previous: Option<String>,
}

type RouteCallback = Box<dyn Fn(&RouteChange) + Send + Sync>;

/// Deduplicating route-change dispatcher.
pub struct NavigationObserver {
    callbacks: Mutex<Vec<RouteCallback>>,
    current: Mutex<Option<String>>,
}

impl NavigationObserver {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
            current: Mutex::new(None),
        }
    }

    /// Register a callback for every future route change.
    pub fn on_route_change<F>(&self, callback: F)
    where
        F: Fn(&RouteChange) + Send + Sync + 'static,
    {
        self.callbacks.lock().unwrap().push(Box::new(callback));
    }

    /// Report the currently observed path. Consecutive reports of the same
    /// path are swallowed, so hosts are free to over-report.
    pub fn observe(&self, path: &str) {
        let change = {
            let mut current = self.current.lock().unwrap();
            if current.as_deref() == Some(path) {
                return;
            }
            let previous = current.replace(path.to_string());
            RouteChange {
                path: path.to_string(),
                previous,
            }
        };

        for callback in self.callbacks.lock().unwrap().iter() {
            callback(&change);
        }
    }

    /// Path as last observed.
    pub fn current_path(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }
}
