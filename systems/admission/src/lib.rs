#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Admission control deciding whether a spawn request becomes a live badge.
//!
//! Two independent gates apply. A capacity gate with hysteresis suppresses
//! spawns once the pool is full and only lifts once it has drained to 80% of
//! capacity. A rate gate keeps a sliding one second window of admissions.
//! Rejections are verdicts, never errors.

use std::{collections::VecDeque, time::Duration};

use lizard_hook_core::DEFAULT_POOL_CAPACITY;

const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Outcome of a single admission decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The request may spawn a badge.
    Admitted,
    /// The pool is full or still draining after having been full.
    RejectedCapacity,
    /// The rolling one second rate cap has been reached.
    RejectedRate,
}

impl Verdict {
    /// Reports whether the request was admitted.
    #[must_use]
    pub const fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Configuration parameters required to construct the admission system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    capacity: usize,
    rate_limit: u32,
}

impl Config {
    /// Creates a configuration with the provided pool capacity and per second cap.
    ///
    /// A `rate_limit` of zero disables the rate gate.
    #[must_use]
    pub const fn new(capacity: usize, rate_limit: u32) -> Self {
        Self {
            capacity,
            rate_limit,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY, 12)
    }
}

/// Stateful gate applied to every spawn request.
#[derive(Debug)]
pub struct Admission {
    capacity: usize,
    resume_at: usize,
    rate_limit: u32,
    window: VecDeque<Duration>,
    suppressed: bool,
}

impl Admission {
    /// Creates a new admission gate using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            capacity: config.capacity,
            resume_at: config.capacity.saturating_mul(4) / 5,
            rate_limit: config.rate_limit,
            window: VecDeque::new(),
            suppressed: false,
        }
    }

    /// Decides whether a request arriving at `now` may spawn, given `live` badges.
    ///
    /// `now` is a monotonic timestamp; only differences between calls matter.
    pub fn admit(&mut self, now: Duration, live: usize) -> Verdict {
        self.observe_live(live);
        if self.suppressed {
            return Verdict::RejectedCapacity;
        }

        self.evict_expired(now);
        if self.rate_limit > 0 && self.window.len() >= self.rate_limit as usize {
            return Verdict::RejectedRate;
        }

        self.window.push_back(now);
        Verdict::Admitted
    }

    /// Updates the capacity hysteresis from the current live badge count.
    pub fn observe_live(&mut self, live: usize) {
        if live >= self.capacity {
            self.suppressed = true;
        } else if self.suppressed && live <= self.resume_at {
            self.suppressed = false;
        }
    }

    /// Replaces the per second cap; zero disables it.
    pub fn set_rate_limit(&mut self, rate_limit: u32) {
        self.rate_limit = rate_limit;
    }

    /// Forgets every admission recorded in the rate window.
    pub fn reset_history(&mut self) {
        self.window.clear();
    }

    /// Whether the capacity gate currently rejects all requests.
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Configured per second cap.
    #[must_use]
    pub const fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    /// Configured pool capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of admissions currently inside the rate window.
    #[must_use]
    pub fn recent_admissions(&self) -> usize {
        self.window.len()
    }

    fn evict_expired(&mut self, now: Duration) {
        while let Some(&oldest) = self.window.front() {
            if now.saturating_sub(oldest) < RATE_WINDOW {
                break;
            }
            let _ = self.window.pop_front();
        }
    }
}

impl Default for Admission {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
