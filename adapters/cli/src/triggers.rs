//! Synthetic input source standing in for the global keyboard and mouse hook.

use std::{
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use lizard_hook_engine::EngineHandle;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Offset mixed into the user seed so triggers and engine draw different streams.
const TRIGGER_STREAM: u64 = 0x7472_6967;

/// Background thread that enqueues spawn requests at a steady rate.
#[derive(Debug)]
pub(crate) struct TriggerSource {
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<u64>>,
}

impl TriggerSource {
    /// Starts firing `per_second` requests at `handle`.
    ///
    /// Returns `None` when the rate is not a positive number.
    pub(crate) fn spawn(
        handle: EngineHandle,
        per_second: f64,
        seed: Option<u64>,
    ) -> Result<Option<Self>> {
        let Some(period) = period(per_second) else {
            tracing::info!(per_second, "synthetic triggers disabled");
            return Ok(None);
        };

        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ TRIGGER_STREAM),
            None => ChaCha8Rng::from_entropy(),
        };
        let (stop, stopped) = mpsc::channel::<()>();
        let join = thread::Builder::new()
            .name("lizard-hook-triggers".to_owned())
            .spawn(move || {
                let mut fired: u64 = 0;
                while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(period) {
                    handle.enqueue_spawn(None, rng.gen(), rng.gen());
                    fired += 1;
                }
                fired
            })
            .context("failed to start trigger source")?;

        Ok(Some(Self {
            stop: Some(stop),
            join: Some(join),
        }))
    }

    /// Stops the thread and returns how many requests it fired.
    pub(crate) fn stop(mut self) -> u64 {
        self.halt()
    }

    fn halt(&mut self) -> u64 {
        drop(self.stop.take());
        match self.join.take().map(JoinHandle::join) {
            Some(Ok(fired)) => fired,
            Some(Err(_)) => {
                tracing::warn!("trigger source panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for TriggerSource {
    fn drop(&mut self) {
        let _ = self.halt();
    }
}

/// Interval between triggers, or `None` for a non-positive or non-finite rate.
pub(crate) fn period(per_second: f64) -> Option<Duration> {
    (per_second.is_finite() && per_second > 0.0)
        .then(|| Duration::try_from_secs_f64(per_second.recip()).ok())
        .flatten()
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::headless::{HeadlessPlatform, LoggingRenderer};
    use lizard_hook_core::OverlaySettings;
    use lizard_hook_engine::{EngineOptions, Overlay};

    #[test]
    fn triggers_fill_the_queue_until_stopped() {
        let overlay = Overlay::new(
            LoggingRenderer::default(),
            HeadlessPlatform::new(Vec::new(), None, None),
            &OverlaySettings::default(),
            EngineOptions::default(),
        );
        let handle = overlay.handle();

        let source = TriggerSource::spawn(handle.clone(), 500.0, Some(3))
            .expect("thread starts")
            .expect("positive rate enables triggers");
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.queued_spawns() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        let fired = source.stop();

        assert!(fired >= 3, "fired {fired}");
        assert_eq!(handle.queued_spawns() as u64, fired);
    }

    #[test]
    fn zero_rate_starts_nothing() {
        let overlay = Overlay::new(
            LoggingRenderer::default(),
            HeadlessPlatform::new(Vec::new(), None, None),
            &OverlaySettings::default(),
            EngineOptions::default(),
        );
        let source = TriggerSource::spawn(overlay.handle(), 0.0, None).expect("no thread needed");
        assert!(source.is_none());
    }

    #[test]
    fn period_is_the_reciprocal_rate() {
        assert_eq!(period(4.0), Some(Duration::from_millis(250)));
        assert_eq!(period(0.5), Some(Duration::from_secs(2)));
    }

    #[test]
    fn unusable_rates_disable_triggers() {
        assert_eq!(period(0.0), None);
        assert_eq!(period(-3.0), None);
        assert_eq!(period(f64::NAN), None);
        assert_eq!(period(f64::INFINITY), None);
    }
}
