use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use lizard_hook_core::{OverlaySettings, SpawnRequest, SpriteId};

use crate::{
    hot_swap::{ConfigSlot, PendingConfig},
    state::SharedState,
    EngineState,
};

/// State shared between the loop thread and every [`EngineHandle`].
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) queue: Mutex<VecDeque<SpawnRequest>>,
    pub(crate) pending: ConfigSlot,
    pub(crate) state: SharedState,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            pending: ConfigSlot::default(),
            state: SharedState::new(),
        }
    }

    pub(crate) fn drain_requests(&self) -> Vec<SpawnRequest> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }
}

/// Cloneable, thread-safe entry point into a running overlay.
///
/// Every method returns immediately; the loop thread picks the work up on its
/// next tick.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Queues a spawn request. `x` and `y` are a normalized position hint.
    ///
    /// Requests made after stop are dropped.
    pub fn enqueue_spawn(&self, sprite: Option<SpriteId>, x: f32, y: f32) {
        if self.state() == EngineState::Stopped {
            return;
        }
        let mut queue = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        queue.push_back(SpawnRequest::new(sprite, x, y));
    }

    /// Publishes a new configuration snapshot, replacing any unapplied one.
    pub fn refresh_from_config(&self, settings: &OverlaySettings) {
        self.shared
            .pending
            .store(PendingConfig::from_settings(settings));
        tracing::debug!("configuration snapshot queued");
    }

    /// Toggles between running and paused; ignored in every other state.
    pub fn set_paused(&self, paused: bool) {
        let (from, to) = if paused {
            (EngineState::Running, EngineState::Paused)
        } else {
            (EngineState::Paused, EngineState::Running)
        };
        if self.shared.state.transition(from, to) {
            tracing::info!(state = %to, "overlay state changed");
        }
    }

    /// Requests the loop to stop. Resources are released once the loop has exited.
    pub fn stop(&self) {
        let previous = self.shared.state.stop();
        if previous != EngineState::Stopped {
            tracing::info!(previous = %previous, "overlay stop requested");
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.shared.state.load()
    }

    /// Whether a configuration snapshot is waiting to be applied.
    #[must_use]
    pub fn has_pending_config(&self) -> bool {
        self.shared.pending.is_pending()
    }

    /// Number of spawn requests waiting for the next tick.
    #[must_use]
    pub fn queued_spawns(&self) -> usize {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }
}
