//! Per-origin suppression state.
//!
//! Two storage scopes with different lifetimes: an ephemeral session scope
//! for seen/dismissed/journey flags (gone when the hosting session ends) and
//! a durable file-backed store for user snoozes and preferences.

pub mod durable;
pub mod session;
