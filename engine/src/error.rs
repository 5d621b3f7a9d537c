use lizard_hook_atlas::AtlasError;
use thiserror::Error;

use crate::EngineState;

/// Errors surfaced by the overlay engine.
///
/// Rejected spawns and failed hot-swaps are not errors; they are counted in
/// [`crate::EngineStats`] and logged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The initial atlas could not be loaded.
    #[error(transparent)]
    Atlas(#[from] AtlasError),
    /// The renderer refused the initial atlas texture.
    #[error("renderer failed to upload the atlas: {0:#}")]
    Upload(anyhow::Error),
    /// The operation is not allowed in the current lifecycle state.
    #[error("cannot {operation} while the overlay is {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the engine was in.
        state: EngineState,
    },
    /// The loop thread could not be started.
    #[error("failed to start the overlay thread")]
    ThreadSpawn(#[source] std::io::Error),
    /// The loop thread panicked before it could hand back its resources.
    #[error("overlay thread panicked")]
    ThreadPanicked,
}
