#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering and platform contracts for Lizard Hook adapters.
//!
//! The engine never talks to a GPU or a windowing system directly. It hands
//! each frame to a [`Renderer`] and asks an injected [`PlatformLayer`] about
//! monitors, the caret and the refresh rate.

use anyhow::Result as AnyResult;
use glam::Vec2;
use lizard_hook_atlas::SpriteAtlas;
use lizard_hook_core::{BadgeSnapshot, BadgeView, MonitorBounds, SpriteUv};
use thiserror::Error;

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    badges: BadgeView,
    uvs: Vec<SpriteUv>,
}

impl Frame {
    /// Creates a frame from the live badges and the active atlas UV table.
    #[must_use]
    pub fn new(badges: BadgeView, uvs: Vec<SpriteUv>) -> Self {
        Self { badges, uvs }
    }

    /// Live badges in spawn order.
    #[must_use]
    pub fn badges(&self) -> &BadgeView {
        &self.badges
    }

    /// UV table of the atlas the badges refer to.
    #[must_use]
    pub fn uvs(&self) -> &[SpriteUv] {
        &self.uvs
    }

    /// Number of badges in the frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.badges.len()
    }

    /// Reports whether the frame draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Resolves each badge to a draw instance, skipping sprites the atlas lacks.
    pub fn instances(&self) -> impl Iterator<Item = SpriteInstance> + '_ {
        self.badges.iter().filter_map(|badge| {
            self.uvs
                .get(badge.sprite.index())
                .map(|uv| SpriteInstance::from_snapshot(badge, *uv))
        })
    }
}

/// One textured quad, ready for instanced drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    /// Centre in normalized viewport coordinates.
    pub position: Vec2,
    /// Size relative to the viewport height.
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
    /// Texture rectangle.
    pub uv: SpriteUv,
}

impl SpriteInstance {
    fn from_snapshot(snapshot: &BadgeSnapshot, uv: SpriteUv) -> Self {
        Self {
            position: snapshot.position,
            scale: snapshot.scale,
            rotation: snapshot.rotation,
            alpha: snapshot.alpha,
            uv,
        }
    }
}

/// Presents frames produced by the engine.
///
/// Calls always originate from the engine's loop thread.
pub trait Renderer {
    /// Uploads the texture of a newly adopted atlas.
    ///
    /// On failure the renderer must keep drawing with its previous texture.
    fn upload_atlas(&mut self, atlas: &SpriteAtlas) -> AnyResult<()>;

    /// Draws one frame.
    fn render(&mut self, frame: &Frame) -> AnyResult<()>;

    /// Releases every GPU resource. Called once, after the loop has exited.
    fn release(&mut self);
}

/// Pixel size of the overlay surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a viewport with the provided dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Monitor rectangle covering the viewport from the origin.
    #[must_use]
    pub const fn as_monitor(&self) -> MonitorBounds {
        MonitorBounds::from_origin_and_size(0, 0, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Failure reported by a platform query.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform does not support the query at all.
    #[error("{0} is not available on this platform")]
    Unavailable(&'static str),
    /// The query is supported but failed this time.
    #[error("platform query failed: {0}")]
    Query(String),
}

/// Window system services consumed by the engine.
///
/// Query failures are never fatal; the engine substitutes safe defaults.
pub trait PlatformLayer {
    /// Monitors in virtual-desktop coordinates.
    fn monitors(&self) -> Result<Vec<MonitorBounds>, PlatformError>;

    /// Absolute caret or cursor position, if one is known.
    fn caret_position(&self) -> Result<Option<Vec2>, PlatformError>;

    /// Monitor hosting the foreground window, if one is known.
    fn foreground_monitor(&self) -> Result<Option<MonitorBounds>, PlatformError>;

    /// Refresh rate of the display in hertz.
    fn refresh_rate(&self) -> Result<u32, PlatformError>;

    /// Size of the overlay surface.
    fn viewport(&self) -> Result<Viewport, PlatformError>;

    /// Services pending window events. Returns `false` once the window is gone.
    fn pump_events(&mut self) -> bool;
}
