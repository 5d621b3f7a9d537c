#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized spawning system that turns admitted placements into badge spawn commands.

use std::{
    f32::consts::{PI, TAU},
    ops::RangeInclusive,
};

use glam::Vec2;
use lizard_hook_core::{BadgeSpawn, Command, SpriteId};
use rand::Rng;

const DRIFT_ANGLE: RangeInclusive<f32> = -0.3..=0.3;
const DRIFT_SPEED: RangeInclusive<f32> = 0.15..=0.3;
const MAX_TILT_DEGREES: f32 = 5.0;
const LIFETIME: RangeInclusive<f32> = 0.7..=1.2;
const FADE_IN: RangeInclusive<f32> = 0.06..=0.12;
const FADE_OUT: RangeInclusive<f32> = 0.2..=0.6;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    min_diameter_px: u32,
    max_diameter_px: u32,
}

impl Config {
    /// Creates a configuration bounding badge diameters in pixels.
    ///
    /// Inverted bounds are collapsed onto `min_diameter_px`.
    #[must_use]
    pub const fn new(min_diameter_px: u32, max_diameter_px: u32) -> Self {
        let max_diameter_px = if max_diameter_px < min_diameter_px {
            min_diameter_px
        } else {
            max_diameter_px
        };
        Self {
            min_diameter_px,
            max_diameter_px,
        }
    }

    /// Smallest badge diameter in pixels.
    #[must_use]
    pub const fn min_diameter_px(&self) -> u32 {
        self.min_diameter_px
    }

    /// Largest badge diameter in pixels.
    #[must_use]
    pub const fn max_diameter_px(&self) -> u32 {
        self.max_diameter_px
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(60, 108)
    }
}

/// Placement decided for an admitted request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Sprite drawn for the badge.
    pub sprite: SpriteId,
    /// Normalized spawn position.
    pub position: Vec2,
}

/// Pure system that rolls the animation parameters of new badges.
#[derive(Debug, Default)]
pub struct Spawning {
    config: Config,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Replaces the size bounds used for subsequent spawns.
    pub fn reconfigure(&mut self, config: Config) {
        self.config = config;
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Emits one spawn command per placement.
    pub fn handle<R>(
        &self,
        placements: &[Placement],
        viewport_height: u32,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        for placement in placements {
            out.push(Command::SpawnBadge {
                spawn: self.roll(*placement, viewport_height, rng),
            });
        }
    }

    /// Rolls the full parameter set of a single badge.
    pub fn roll<R>(&self, placement: Placement, viewport_height: u32, rng: &mut R) -> BadgeSpawn
    where
        R: Rng + ?Sized,
    {
        let angle = rng.gen_range(DRIFT_ANGLE);
        let speed = rng.gen_range(DRIFT_SPEED);
        let wobble_phase = rng.gen_range(0.0..TAU);
        let tilt = MAX_TILT_DEGREES * PI / 180.0;
        let rotation = rng.gen_range(-tilt..=tilt);
        let lifetime = rng.gen_range(LIFETIME);
        let fade_in = rng.gen_range(FADE_IN);
        let fade_out = rng.gen_range(FADE_OUT);
        let diameter =
            rng.gen_range(self.config.min_diameter_px..=self.config.max_diameter_px) as f32;

        BadgeSpawn {
            sprite: placement.sprite,
            position: placement.position,
            velocity: Vec2::new(angle.sin() * speed, angle.cos() * speed),
            wobble_phase,
            scale: diameter * 2.0 / viewport_height.max(1) as f32,
            rotation,
            lifetime,
            fade_in,
            fade_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_bounds_collapse_to_minimum() {
        let config = Config::new(90, 40);
        assert_eq!(config.min_diameter_px(), 90);
        assert_eq!(config.max_diameter_px(), 90);
    }
}
