#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative state of the live badges shown by the overlay.
//!
//! The pool is only ever mutated through [`apply`], which executes a
//! [`Command`] and reports what changed as [`Event`] values. Read access goes
//! through the [`query`] module.

use std::f32::consts::TAU;

use glam::Vec2;
use lizard_hook_core::{BadgeId, BadgeSpawn, Command, Event, SpriteId};

/// Radius of the circular wobble superimposed on the drift, in normalized units per second.
const WOBBLE_AMPLITUDE: f32 = 0.02;

/// Owns every live badge and advances their animation.
#[derive(Debug, Default)]
pub struct BadgePool {
    badges: Vec<Badge>,
    next_id: u64,
}

impl BadgePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> BadgeId {
        let id = BadgeId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn advance(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        for badge in &mut self.badges {
            badge.advance(dt);
        }

        self.badges.retain(|badge| {
            if badge.is_expired() {
                out_events.push(Event::BadgeExpired { badge: badge.id });
                false
            } else {
                true
            }
        });
    }
}

/// Applies the provided command to the pool, mutating state deterministically.
pub fn apply(pool: &mut BadgePool, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnBadge { spawn } => {
            if !(spawn.lifetime.is_finite() && spawn.lifetime > 0.0) {
                return;
            }
            let id = pool.allocate_id();
            pool.badges.push(Badge::from_spawn(id, spawn));
            out_events.push(Event::BadgeSpawned {
                badge: id,
                sprite: spawn.sprite,
            });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            pool.advance(dt.as_secs_f32(), out_events);
        }
        Command::Clear => {
            let removed = pool.badges.len();
            pool.badges.clear();
            out_events.push(Event::PoolCleared { removed });
        }
    }
}

/// Query functions that provide read-only access to the pool.
pub mod query {
    use lizard_hook_core::{BadgeId, BadgeSnapshot, BadgeView};

    use super::BadgePool;

    /// Number of badges currently alive.
    #[must_use]
    pub fn live_count(pool: &BadgePool) -> usize {
        pool.badges.len()
    }

    /// Captures a read-only view of every live badge in spawn order.
    #[must_use]
    pub fn badge_view(pool: &BadgePool) -> BadgeView {
        BadgeView::from_snapshots(pool.badges.iter().map(|badge| badge.snapshot()).collect())
    }

    /// Captures a single badge, if it is still alive.
    #[must_use]
    pub fn badge(pool: &BadgePool, id: BadgeId) -> Option<BadgeSnapshot> {
        pool.badges
            .iter()
            .find(|badge| badge.id == id)
            .map(|badge| badge.snapshot())
    }
}

#[derive(Clone, Debug)]
struct Badge {
    id: BadgeId,
    position: Vec2,
    velocity: Vec2,
    wobble_phase: f32,
    scale: f32,
    rotation: f32,
    alpha: f32,
    elapsed: f32,
    lifetime: f32,
    fade_in: f32,
    fade_out: f32,
    sprite: SpriteId,
}

impl Badge {
    fn from_spawn(id: BadgeId, spawn: BadgeSpawn) -> Self {
        Self {
            id,
            position: spawn.position,
            velocity: spawn.velocity,
            wobble_phase: spawn.wobble_phase,
            scale: spawn.scale,
            rotation: spawn.rotation,
            alpha: fade_alpha(0.0, spawn.lifetime, spawn.fade_in, spawn.fade_out),
            elapsed: 0.0,
            lifetime: spawn.lifetime,
            fade_in: spawn.fade_in,
            fade_out: spawn.fade_out,
            sprite: spawn.sprite,
        }
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        let angle = TAU * self.elapsed + self.wobble_phase;
        let wobble = Vec2::new(angle.sin(), angle.cos()) * WOBBLE_AMPLITUDE;
        self.position += (self.velocity + wobble) * dt;
        self.alpha = fade_alpha(self.elapsed, self.lifetime, self.fade_in, self.fade_out);
    }

    fn is_expired(&self) -> bool {
        self.elapsed >= self.lifetime
    }

    fn snapshot(&self) -> lizard_hook_core::BadgeSnapshot {
        lizard_hook_core::BadgeSnapshot {
            id: self.id,
            position: self.position,
            scale: self.scale,
            rotation: self.rotation,
            alpha: self.alpha,
            sprite: self.sprite,
            elapsed: self.elapsed,
            lifetime: self.lifetime,
        }
    }
}

/// Cubic ease-out: fast start, gentle landing. Input is clamped to `0.0..=1.0`.
#[must_use]
pub fn ease_out(t: f32) -> f32 {
    let remaining = 1.0 - t.clamp(0.0, 1.0);
    1.0 - remaining * remaining * remaining
}

/// Opacity of a badge `elapsed` seconds into its life.
///
/// The opening fade wins when it overlaps the closing fade.
#[must_use]
pub fn fade_alpha(elapsed: f32, lifetime: f32, fade_in: f32, fade_out: f32) -> f32 {
    let alpha = if fade_in > 0.0 && elapsed < fade_in {
        ease_out(elapsed / fade_in)
    } else if fade_out > 0.0 && elapsed > lifetime - fade_out {
        ease_out(((lifetime - elapsed) / fade_out).clamp(0.0, 1.0))
    } else {
        1.0
    };
    alpha.clamp(0.0, 1.0)
}
