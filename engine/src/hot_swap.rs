use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};

use lizard_hook_core::{FpsMode, OverlaySettings, SpawnStrategy, DEFAULT_FPS};

/// Normalized configuration snapshot waiting to be applied by the loop thread.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingConfig {
    /// Placement strategy for new badges.
    pub strategy: SpawnStrategy,
    /// Smallest badge diameter in pixels.
    pub min_px: u32,
    /// Largest badge diameter in pixels, never below `min_px`.
    pub max_px: u32,
    /// Admitted spawns per rolling second; zero disables the cap.
    pub rate_limit: u32,
    /// How the frame rate is chosen.
    pub fps_mode: FpsMode,
    /// Frame rate used in fixed mode, never zero.
    pub fps_fixed: u32,
    /// Atlas image path as configured; `None` selects the built-in atlas.
    ///
    /// The loop thread normalizes it before comparing or loading.
    pub atlas_path: Option<PathBuf>,
    /// Sprite names picked with equal weight when `emoji_weighted` is empty.
    pub emoji: Vec<String>,
    /// Sprite names with strictly positive finite weights.
    pub emoji_weighted: BTreeMap<String, f64>,
}

impl PendingConfig {
    /// Builds a snapshot from raw settings, repairing values the engine cannot use.
    #[must_use]
    pub fn from_settings(settings: &OverlaySettings) -> Self {
        let min_px = settings.badge_min_px;
        let mut max_px = settings.badge_max_px;
        if max_px < min_px {
            tracing::warn!(min_px, max_px, "badge_max_px is below badge_min_px; clamping");
            max_px = min_px;
        }

        let fps_fixed = if settings.fps_fixed == 0 {
            tracing::warn!(fallback = DEFAULT_FPS, "fps_fixed must be positive");
            DEFAULT_FPS
        } else {
            settings.fps_fixed
        };

        let emoji_weighted: BTreeMap<String, f64> = settings
            .emoji_weighted
            .iter()
            .filter(|(name, weight)| {
                let valid = weight.is_finite() && **weight > 0.0;
                if !valid {
                    tracing::warn!(sprite = %name, weight = **weight, "dropping sprite weight");
                }
                valid
            })
            .map(|(name, weight)| (name.clone(), *weight))
            .collect();
        let emoji = if emoji_weighted.is_empty() {
            settings.emoji.clone()
        } else {
            Vec::new()
        };

        Self {
            strategy: settings.badge_spawn_strategy,
            min_px,
            max_px,
            rate_limit: settings.badges_per_second_max,
            fps_mode: settings.fps_mode,
            fps_fixed,
            atlas_path: settings.emoji_atlas.clone(),
            emoji,
            emoji_weighted,
        }
    }
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self::from_settings(&OverlaySettings::default())
    }
}

/// Single-slot mailbox: the newest snapshot replaces any unapplied one.
#[derive(Debug, Default)]
pub(crate) struct ConfigSlot {
    slot: Mutex<Option<PendingConfig>>,
    dirty: AtomicBool,
}

impl ConfigSlot {
    pub(crate) fn store(&self, config: PendingConfig) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(config);
        self.dirty.store(true, Ordering::Release);
    }

    /// Takes the pending snapshot, if any. Cheap when nothing is pending.
    pub(crate) fn take(&self) -> Option<PendingConfig> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}
