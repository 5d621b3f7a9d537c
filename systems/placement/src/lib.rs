#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Topology-aware placement of newly admitted badges.
//!
//! Monitors are described in virtual-desktop pixels. Sampled points are
//! converted to normalized viewport coordinates, where `(0, 0)` is the
//! top-left corner of the virtual desktop and `(1, 1)` the bottom-right one.

use glam::Vec2;
use lizard_hook_core::{virtual_desktop, MonitorBounds, SpawnStrategy, DEFAULT_INSET_PX};
use rand::Rng;

/// Snapshot of the display topology at the moment a badge is placed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    monitors: Vec<MonitorBounds>,
    caret: Option<Vec2>,
    foreground: Option<MonitorBounds>,
}

impl Topology {
    /// Creates a topology from the provided monitors, without caret or foreground data.
    #[must_use]
    pub fn new(monitors: Vec<MonitorBounds>) -> Self {
        Self {
            monitors,
            caret: None,
            foreground: None,
        }
    }

    /// Attaches the absolute caret or cursor position.
    #[must_use]
    pub fn with_caret(mut self, caret: Option<Vec2>) -> Self {
        self.caret = caret;
        self
    }

    /// Attaches the monitor hosting the foreground window.
    #[must_use]
    pub fn with_foreground(mut self, foreground: Option<MonitorBounds>) -> Self {
        self.foreground = foreground;
        self
    }

    /// Known monitors in platform order.
    #[must_use]
    pub fn monitors(&self) -> &[MonitorBounds] {
        &self.monitors
    }

    /// Absolute caret position, when the platform reported one.
    #[must_use]
    pub fn caret(&self) -> Option<Vec2> {
        self.caret
    }

    /// Monitor hosting the foreground window, when known.
    #[must_use]
    pub fn foreground(&self) -> Option<MonitorBounds> {
        self.foreground
    }

    fn desktop(&self) -> Option<MonitorBounds> {
        let desktop = virtual_desktop(&self.monitors);
        match (desktop, self.foreground) {
            (Some(desktop), Some(foreground)) => Some(desktop.union(&foreground)),
            (desktop, foreground) => desktop.or(foreground),
        }
    }
}

/// Computes normalized spawn positions for both placement strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementSampler {
    inset_px: i32,
}

impl PlacementSampler {
    /// Creates a sampler that keeps `inset_px` pixels clear along every monitor edge.
    #[must_use]
    pub const fn new(inset_px: i32) -> Self {
        Self { inset_px }
    }

    /// Margin kept clear along monitor edges.
    #[must_use]
    pub const fn inset_px(&self) -> i32 {
        self.inset_px
    }

    /// Picks the normalized position of a new badge.
    ///
    /// `requested` is the caller supplied hint. Random placement ignores it;
    /// caret placement uses it only when nothing better is known.
    pub fn sample<R>(
        &self,
        strategy: SpawnStrategy,
        topology: &Topology,
        requested: Vec2,
        rng: &mut R,
    ) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let point = match strategy {
            SpawnStrategy::RandomScreen => self.random_screen(topology, rng),
            SpawnStrategy::NearCaret => self.near_caret(topology, requested, rng),
        };
        clamp_unit(point)
    }

    fn random_screen<R>(&self, topology: &Topology, rng: &mut R) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let Some(desktop) = topology.desktop() else {
            return Vec2::new(rng.gen::<f32>(), rng.gen::<f32>());
        };
        let Some(monitor) = self.choose_monitor(topology.monitors(), rng) else {
            return Vec2::new(rng.gen::<f32>(), rng.gen::<f32>());
        };
        normalize(self.sample_within(&monitor, rng), &desktop)
    }

    fn near_caret<R>(&self, topology: &Topology, requested: Vec2, rng: &mut R) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let Some(desktop) = topology.desktop() else {
            return requested;
        };
        if let Some(caret) = topology.caret() {
            return normalize(caret, &desktop);
        }
        let fallback = topology
            .foreground()
            .or_else(|| topology.monitors().first().copied());
        match fallback {
            Some(monitor) => normalize(self.sample_within(&monitor, rng), &desktop),
            None => requested,
        }
    }

    /// Picks a monitor with probability proportional to its usable area.
    fn choose_monitor<R>(&self, monitors: &[MonitorBounds], rng: &mut R) -> Option<MonitorBounds>
    where
        R: Rng + ?Sized,
    {
        let first = *monitors.first()?;
        let weights: Vec<u64> = monitors
            .iter()
            .map(|monitor| usable_area(monitor, self.inset_px))
            .collect();
        let total = weights.iter().copied().fold(0_u64, u64::saturating_add);
        if total == 0 {
            return Some(first);
        }

        let mut roll = rng.gen_range(0..total);
        for (monitor, weight) in monitors.iter().zip(&weights) {
            if roll < *weight {
                return Some(*monitor);
            }
            roll -= weight;
        }
        Some(first)
    }

    /// Uniform absolute point inside the inset rectangle of `monitor`.
    fn sample_within<R>(&self, monitor: &MonitorBounds, rng: &mut R) -> Vec2
    where
        R: Rng + ?Sized,
    {
        Vec2::new(
            sample_axis(monitor.left(), monitor.right(), self.inset_px, rng),
            sample_axis(monitor.top(), monitor.bottom(), self.inset_px, rng),
        )
    }
}

impl Default for PlacementSampler {
    fn default() -> Self {
        Self::new(DEFAULT_INSET_PX)
    }
}

/// Area left after the inset, or the raw area when the inset swallows the monitor.
#[must_use]
pub fn usable_area(monitor: &MonitorBounds, inset_px: i32) -> u64 {
    monitor
        .inset(inset_px)
        .map_or_else(|| monitor.area(), |inset| inset.area())
}

/// Converts an absolute desktop point into clamped normalized coordinates.
#[must_use]
pub fn normalize(point: Vec2, desktop: &MonitorBounds) -> Vec2 {
    let origin = Vec2::new(desktop.left() as f32, desktop.top() as f32);
    let size = Vec2::new(
        desktop.width().max(1) as f32,
        desktop.height().max(1) as f32,
    );
    clamp_unit((point - origin) / size)
}

fn sample_axis<R>(start: i32, end: i32, inset_px: i32, rng: &mut R) -> f32
where
    R: Rng + ?Sized,
{
    let low = start as f32 + inset_px as f32;
    let high = end as f32 - inset_px as f32;
    if high > low {
        rng.gen_range(low..high)
    } else {
        (start as f32 + end as f32) * 0.5
    }
}

fn clamp_unit(point: Vec2) -> Vec2 {
    let x = if point.x.is_nan() { 0.5 } else { point.x };
    let y = if point.y.is_nan() { 0.5 } else { point.y };
    Vec2::new(x, y).clamp(Vec2::ZERO, Vec2::ONE)
}
