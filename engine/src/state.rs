use std::{
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

/// Lifecycle of the frame scheduler.
///
/// `Uninitialized → Initialized → Running ⇄ Paused → Stopped`; `Stopped` is
/// reachable from every state and is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EngineState {
    /// Created but the initial atlas has not been loaded yet.
    Uninitialized = 0,
    /// Atlas loaded; the loop has not started.
    Initialized = 1,
    /// The loop animates and renders every tick.
    Running = 2,
    /// The loop only pumps platform events.
    Paused = 3,
    /// Stop was requested or the loop has exited.
    Stopped = 4,
}

impl EngineState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Initialized,
            2 => Self::Running,
            3 => Self::Paused,
            _ => Self::Stopped,
        }
    }

    /// Lowercase name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state shared between the loop thread and every handle.
#[derive(Debug)]
pub(crate) struct SharedState(AtomicU8);

impl SharedState {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(EngineState::Uninitialized as u8))
    }

    pub(crate) fn load(&self) -> EngineState {
        EngineState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from `from` to `to`; fails if another thread got there first.
    pub(crate) fn transition(&self, from: EngineState, to: EngineState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn stop(&self) -> EngineState {
        EngineState::from_u8(self.0.swap(EngineState::Stopped as u8, Ordering::AcqRel))
    }
}
