#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lizard Hook overlay.
//!
//! This crate defines the message surface that connects the frame scheduler,
//! the authoritative badge pool, and the pure systems. The scheduler submits
//! [`Command`] values describing desired mutations, the pool executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what changed. Systems never touch the pool directly; they read
//! immutable snapshots such as [`BadgeView`] and answer with new commands.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of live badges at which the overlay stops admitting new spawns.
pub const DEFAULT_POOL_CAPACITY: usize = 150;

/// Padding in pixels kept clear along every monitor edge when sampling placement.
pub const DEFAULT_INSET_PX: i32 = 24;

/// Frame rate used whenever the display refresh rate cannot be determined.
pub const DEFAULT_FPS: u32 = 60;

/// Name of the sprite used when an atlas carries no usable description.
pub const DEFAULT_SPRITE_NAME: &str = "\u{1F98E}";

/// Strategy that decides where a newly admitted badge appears.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStrategy {
    /// Anywhere on any monitor, weighted by usable monitor area.
    #[default]
    RandomScreen,
    /// At the text caret or cursor, falling back to the foreground monitor.
    NearCaret,
}

/// Controls how the frame scheduler derives its target frame rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpsMode {
    /// Follow the refresh rate reported by the display.
    #[default]
    Auto,
    /// Use the configured fixed frame rate.
    Fixed,
}

/// Index of a sprite within the active atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u32);

impl SpriteId {
    /// Creates a new sprite identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the sprite inside the atlas UV table.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a badge by the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BadgeId(u64);

impl BadgeId {
    /// Creates a new badge identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Texture-space rectangle describing where a sprite lives inside the atlas.
///
/// Missing fields in an atlas description default to the full texture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteUv {
    /// Left edge in normalized texture coordinates.
    pub u0: f32,
    /// Top edge in normalized texture coordinates.
    pub v0: f32,
    /// Right edge in normalized texture coordinates.
    pub u1: f32,
    /// Bottom edge in normalized texture coordinates.
    pub v1: f32,
}

impl SpriteUv {
    /// Creates a rectangle from its four edges.
    #[must_use]
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Rectangle covering the whole texture.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

impl Default for SpriteUv {
    fn default() -> Self {
        Self::full()
    }
}

/// Rectangle of a single monitor in virtual-desktop pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MonitorBounds {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl MonitorBounds {
    /// Creates monitor bounds from its four edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates monitor bounds from an origin and a size.
    #[must_use]
    pub const fn from_origin_and_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x.saturating_add(width as i32),
            y.saturating_add(height as i32),
        )
    }

    /// Left edge of the monitor.
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.left
    }

    /// Top edge of the monitor.
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.top
    }

    /// Right edge of the monitor, exclusive.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.right
    }

    /// Bottom edge of the monitor, exclusive.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Horizontal extent in pixels; zero for inverted rectangles.
    #[must_use]
    pub fn width(&self) -> u32 {
        u32::try_from(i64::from(self.right) - i64::from(self.left)).unwrap_or(0)
    }

    /// Vertical extent in pixels; zero for inverted rectangles.
    #[must_use]
    pub fn height(&self) -> u32 {
        u32::try_from(i64::from(self.bottom) - i64::from(self.top)).unwrap_or(0)
    }

    /// Number of pixels covered by the monitor.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Reports whether the rectangle covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Shrinks every edge by `margin` pixels.
    ///
    /// Returns `None` when the margin collapses either dimension.
    #[must_use]
    pub fn inset(&self, margin: i32) -> Option<Self> {
        let inset = Self::new(
            self.left.saturating_add(margin),
            self.top.saturating_add(margin),
            self.right.saturating_sub(margin),
            self.bottom.saturating_sub(margin),
        );
        (!inset.is_empty()).then_some(inset)
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left as f32 + self.right as f32) * 0.5,
            (self.top as f32 + self.bottom as f32) * 0.5,
        )
    }

    /// Reports whether the absolute point lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left as f32
            && point.x < self.right as f32
            && point.y >= self.top as f32
            && point.y < self.bottom as f32
    }
}

/// Computes the virtual desktop: the bounding box of every monitor.
#[must_use]
pub fn virtual_desktop(monitors: &[MonitorBounds]) -> Option<MonitorBounds> {
    let (first, rest) = monitors.split_first()?;
    Some(rest.iter().fold(*first, |acc, monitor| acc.union(monitor)))
}

/// Request to spawn a badge, as submitted by an input source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Sprite explicitly requested by the caller, if any.
    pub sprite: Option<SpriteId>,
    /// Caller-supplied normalized position hint.
    pub position: Vec2,
}

impl SpawnRequest {
    /// Creates a new spawn request.
    #[must_use]
    pub const fn new(sprite: Option<SpriteId>, x: f32, y: f32) -> Self {
        Self {
            sprite,
            position: Vec2::new(x, y),
        }
    }
}

/// Visual configuration snapshot as exposed by the configuration store.
///
/// Unknown keys are ignored so one file can carry settings for other
/// subsystems as well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Placement strategy for new badges.
    pub badge_spawn_strategy: SpawnStrategy,
    /// Smallest badge diameter in pixels.
    pub badge_min_px: u32,
    /// Largest badge diameter in pixels.
    pub badge_max_px: u32,
    /// Admitted spawns per rolling second; zero disables the cap.
    pub badges_per_second_max: u32,
    /// How the frame rate is chosen.
    pub fps_mode: FpsMode,
    /// Frame rate used when `fps_mode` is fixed.
    pub fps_fixed: u32,
    /// Optional path of the atlas image.
    pub emoji_atlas: Option<PathBuf>,
    /// Sprite names picked with equal weight.
    pub emoji: Vec<String>,
    /// Sprite names with explicit weights; wins over `emoji` when non-empty.
    pub emoji_weighted: BTreeMap<String, f64>,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            badge_spawn_strategy: SpawnStrategy::RandomScreen,
            badge_min_px: 60,
            badge_max_px: 108,
            badges_per_second_max: 12,
            fps_mode: FpsMode::Auto,
            fps_fixed: DEFAULT_FPS,
            emoji_atlas: None,
            emoji: vec![DEFAULT_SPRITE_NAME.to_owned()],
            emoji_weighted: BTreeMap::new(),
        }
    }
}

/// Fully resolved parameters of a badge about to enter the pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BadgeSpawn {
    /// Sprite drawn for the badge.
    pub sprite: SpriteId,
    /// Starting position in normalized viewport coordinates.
    pub position: Vec2,
    /// Drift applied every second, in normalized units.
    pub velocity: Vec2,
    /// Phase offset of the circular wobble, in radians.
    pub wobble_phase: f32,
    /// Render scale relative to the viewport height.
    pub scale: f32,
    /// Fixed rotation in radians.
    pub rotation: f32,
    /// Total lifetime in seconds.
    pub lifetime: f32,
    /// Duration of the opening fade in seconds.
    pub fade_in: f32,
    /// Duration of the closing fade in seconds.
    pub fade_out: f32,
}

/// Commands that express all permissible badge pool mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Inserts a new badge using the fully resolved parameters.
    SpawnBadge {
        /// Parameters of the new badge.
        spawn: BadgeSpawn,
    },
    /// Advances every live badge by the provided delta time.
    Tick {
        /// Wall-clock time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Removes every live badge at once.
    Clear,
}

/// Events broadcast by the pool after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a badge entered the pool.
    BadgeSpawned {
        /// Identifier assigned to the badge.
        badge: BadgeId,
        /// Sprite drawn for the badge.
        sprite: SpriteId,
    },
    /// Indicates that the animation clock advanced.
    TimeAdvanced {
        /// Duration that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that a badge reached the end of its lifetime and was removed.
    BadgeExpired {
        /// Identifier of the expired badge.
        badge: BadgeId,
    },
    /// Reports that every live badge was discarded.
    PoolCleared {
        /// Number of badges removed.
        removed: usize,
    },
}

/// Immutable representation of a single badge used for queries and rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BadgeSnapshot {
    /// Unique identifier assigned to the badge.
    pub id: BadgeId,
    /// Current position in normalized viewport coordinates.
    pub position: Vec2,
    /// Render scale relative to the viewport height.
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
    /// Sprite drawn for the badge.
    pub sprite: SpriteId,
    /// Seconds since the badge spawned.
    pub elapsed: f32,
    /// Total lifetime in seconds.
    pub lifetime: f32,
}

/// Read-only snapshot describing all live badges.
#[derive(Clone, Debug, Default)]
pub struct BadgeView {
    snapshots: Vec<BadgeSnapshot>,
}

impl BadgeView {
    /// Creates a new badge view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BadgeSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &BadgeSnapshot> {
        self.snapshots.iter()
    }

    /// Number of badges captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no badges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BadgeSnapshot> {
        self.snapshots
    }
}
