/// Counters accumulated by the loop thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Frames handed to the renderer.
    pub frames: u64,
    /// Spawn requests that became badges.
    pub admitted: u64,
    /// Spawn requests dropped by the capacity gate.
    pub rejected_capacity: u64,
    /// Spawn requests dropped by the rate gate.
    pub rejected_rate: u64,
    /// Spawn requests discarded because the overlay was paused.
    pub discarded_paused: u64,
    /// Configuration snapshots applied.
    pub swaps_applied: u64,
    /// Configuration snapshots whose atlas change was refused.
    pub swaps_rejected: u64,
}

impl EngineStats {
    /// Spawn requests that did not become badges, for any reason.
    #[must_use]
    pub const fn rejected(&self) -> u64 {
        self.rejected_capacity + self.rejected_rate + self.discarded_paused
    }
}
