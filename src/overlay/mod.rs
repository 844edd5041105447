//! Overlay model and lifecycle: the render-ready privacy insight, the
//! attribute severity table it leans on, and the state machine that decides
//! when the overlay is visible and which insight it shows.

pub mod insight;
pub mod lifecycle;
pub mod severity;
