#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Badge engine of the Lizard Hook overlay.
//!
//! Any thread may hold an [`EngineHandle`] and queue spawn requests or publish
//! configuration snapshots. Exactly one thread owns the [`Overlay`] and drives
//! the frame loop: it applies pending configuration between ticks, runs queued
//! requests through admission, placement and selection, advances the badge
//! pool and hands the result to the [`Renderer`](lizard_hook_rendering::Renderer).

mod error;
mod handle;
mod hot_swap;
mod scheduler;
mod state;
mod stats;

use lizard_hook_core::{DEFAULT_INSET_PX, DEFAULT_POOL_CAPACITY};

pub use self::{
    error::EngineError,
    handle::EngineHandle,
    hot_swap::PendingConfig,
    scheduler::{Overlay, OverlayThread},
    state::EngineState,
    stats::EngineStats,
};

/// Tuning knobs that are fixed for the lifetime of an overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Live badge count at which admission is suppressed.
    pub pool_capacity: usize,
    /// Seed of the engine's random generator; `None` draws one from the OS.
    pub rng_seed: Option<u64>,
    /// Pixels kept clear along monitor edges when sampling placement.
    pub inset_px: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            rng_seed: None,
            inset_px: DEFAULT_INSET_PX,
        }
    }
}
