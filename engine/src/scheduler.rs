use std::{
    path::Path,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::Context;
use lizard_hook_atlas::{normalize_source, SpriteAtlas};
use lizard_hook_core::{BadgeView, Command, Event, FpsMode, OverlaySettings, DEFAULT_FPS};
use lizard_hook_pool::{self as pool, query, BadgePool};
use lizard_hook_rendering::{Frame, PlatformLayer, Renderer, Viewport};
use lizard_hook_system_admission::{Admission, Config as AdmissionConfig, Verdict};
use lizard_hook_system_placement::{PlacementSampler, Topology};
use lizard_hook_system_selection::WeightedSelector;
use lizard_hook_system_spawning::{Config as SpawnConfig, Placement, Spawning};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    handle::{EngineHandle, Shared},
    EngineError, EngineOptions, EngineState, EngineStats, PendingConfig,
};

const STATS_REPORT_INTERVAL: Duration = Duration::from_secs(1);
const THREAD_NAME: &str = "lizard-hook-overlay";

#[derive(Debug)]
struct ActiveAtlas {
    atlas: SpriteAtlas,
    selector: WeightedSelector,
}

#[derive(Clone, Copy, Debug)]
struct FrameClock {
    origin: Instant,
    last: Option<Instant>,
}

impl FrameClock {
    fn new(origin: Instant) -> Self {
        Self { origin, last: None }
    }

    /// Time since the previous tick; zero on the first tick after a start or resume.
    fn advance(&mut self, now: Instant) -> Duration {
        let dt = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last = Some(now);
        dt
    }

    fn since_origin(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.origin)
    }
}

/// Owner of all animation, atlas and selector state; drives the frame loop.
pub struct Overlay<R, P> {
    renderer: R,
    platform: P,
    handle: EngineHandle,
    config: PendingConfig,
    active: Option<ActiveAtlas>,
    admission: Admission,
    placement: PlacementSampler,
    spawning: Spawning,
    pool: BadgePool,
    rng: ChaCha8Rng,
    clock: FrameClock,
    frame_interval: Duration,
    stats: EngineStats,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl<R, P> Overlay<R, P>
where
    R: Renderer,
    P: PlatformLayer,
{
    /// Creates an uninitialized overlay from the initial settings.
    #[must_use]
    pub fn new(renderer: R, platform: P, settings: &OverlaySettings, options: EngineOptions) -> Self {
        let config = PendingConfig::from_settings(settings);
        let rng = options
            .rng_seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);

        Self {
            renderer,
            platform,
            handle: EngineHandle::new(Arc::new(Shared::new())),
            admission: Admission::new(AdmissionConfig::new(
                options.pool_capacity,
                config.rate_limit,
            )),
            placement: PlacementSampler::new(options.inset_px),
            spawning: Spawning::new(SpawnConfig::new(config.min_px, config.max_px)),
            config,
            active: None,
            pool: BadgePool::new(),
            rng,
            clock: FrameClock::new(Instant::now()),
            frame_interval: interval_for(DEFAULT_FPS),
            stats: EngineStats::default(),
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Handle that other threads use to talk to this overlay.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.handle.state()
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Snapshot of the live badges.
    #[must_use]
    pub fn badges(&self) -> BadgeView {
        query::badge_view(&self.pool)
    }

    /// Atlas in use, once initialized.
    #[must_use]
    pub fn atlas(&self) -> Option<&SpriteAtlas> {
        self.active.as_ref().map(|active| &active.atlas)
    }

    /// Sprite selector in use, once initialized.
    #[must_use]
    pub fn selector(&self) -> Option<&WeightedSelector> {
        self.active.as_ref().map(|active| &active.selector)
    }

    /// Configuration currently applied.
    #[must_use]
    pub fn config(&self) -> &PendingConfig {
        &self.config
    }

    /// Target duration of one frame.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// The renderer this overlay draws with.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Loads the initial atlas and builds the initial selector.
    ///
    /// On failure the overlay stays uninitialized and must not be run.
    pub fn init(&mut self) -> Result<(), EngineError> {
        self.expect_state("initialize", EngineState::Uninitialized)?;
        self.config.atlas_path = self.config.atlas_path.as_deref().map(normalize_source);

        let atlas = SpriteAtlas::load(self.config.atlas_path.as_deref()).map_err(|error| {
            tracing::error!(%error, "failed to load sprite atlas");
            EngineError::from(error)
        })?;
        self.renderer.upload_atlas(&atlas).map_err(|error| {
            tracing::error!(error = %format!("{error:#}"), "renderer rejected sprite atlas");
            EngineError::Upload(error)
        })?;
        let selector =
            WeightedSelector::build(&atlas, &self.config.emoji, &self.config.emoji_weighted);
        tracing::info!(
            sprites = atlas.len(),
            candidates = selector.len(),
            "overlay initialized"
        );
        self.active = Some(ActiveAtlas { atlas, selector });
        self.frame_interval = self.resolve_frame_interval();

        if !self
            .handle
            .shared()
            .state
            .transition(EngineState::Uninitialized, EngineState::Initialized)
        {
            return Err(EngineError::InvalidState {
                operation: "initialize",
                state: self.state(),
            });
        }
        Ok(())
    }

    /// Moves an initialized overlay to running without entering the loop.
    ///
    /// `now` becomes the origin of the rate limiter's clock.
    pub fn start(&mut self, now: Instant) -> Result<(), EngineError> {
        if !self
            .handle
            .shared()
            .state
            .transition(EngineState::Initialized, EngineState::Running)
        {
            return Err(EngineError::InvalidState {
                operation: "start",
                state: self.state(),
            });
        }
        self.clock = FrameClock::new(now);
        tracing::info!(
            frame_interval_us = self.frame_interval.as_micros() as u64,
            "overlay running"
        );
        Ok(())
    }

    /// Runs the frame loop on the calling thread until stop is requested.
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.state() == EngineState::Stopped {
            return Ok(());
        }
        self.start(Instant::now())?;

        let mut report_at = Instant::now();
        let mut reported = self.stats;
        loop {
            let started = Instant::now();
            if !self.step(started) {
                break;
            }

            if started.saturating_duration_since(report_at) >= STATS_REPORT_INTERVAL {
                tracing::trace!(
                    frames = self.stats.frames - reported.frames,
                    admitted = self.stats.admitted - reported.admitted,
                    rejected = self.stats.rejected() - reported.rejected(),
                    live = query::live_count(&self.pool),
                    "frame stats"
                );
                report_at = started;
                reported = self.stats;
            }

            thread::sleep(self.frame_interval.saturating_sub(started.elapsed()));
        }

        self.handle.stop();
        tracing::info!(frames = self.stats.frames, "overlay loop exited");
        Ok(())
    }

    /// Executes a single tick. Returns `false` once the loop should exit.
    pub fn step(&mut self, now: Instant) -> bool {
        match self.state() {
            EngineState::Running | EngineState::Paused => {}
            EngineState::Uninitialized | EngineState::Initialized | EngineState::Stopped => {
                return false;
            }
        }

        if !self.platform.pump_events() {
            tracing::info!("platform closed the overlay surface");
            self.handle.stop();
            return false;
        }

        if self.state() == EngineState::Paused {
            let discarded = self.handle.shared().drain_requests().len();
            self.stats.discarded_paused += discarded as u64;
            self.clock.last = None;
            return true;
        }

        if let Some(config) = self.handle.shared().pending.take() {
            self.apply_config(config);
        }

        self.admit_requests(now);

        let dt = self.clock.advance(now);
        pool::apply(&mut self.pool, Command::Tick { dt }, &mut self.events);
        self.admission.observe_live(query::live_count(&self.pool));
        self.events.clear();

        self.present();
        true
    }

    /// Stops the overlay and releases its resources. Returns the final counters.
    pub fn shutdown(mut self) -> EngineStats {
        self.handle.stop();
        pool::apply(&mut self.pool, Command::Clear, &mut self.events);
        self.active = None;
        self.renderer.release();
        tracing::info!(
            frames = self.stats.frames,
            admitted = self.stats.admitted,
            rejected = self.stats.rejected(),
            "overlay resources released"
        );
        self.stats
    }

    fn expect_state(&self, operation: &'static str, expected: EngineState) -> Result<(), EngineError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidState { operation, state })
        }
    }

    fn apply_config(&mut self, mut config: PendingConfig) {
        let Some(active) = self.active.as_mut() else {
            self.config = config;
            return;
        };

        config.atlas_path = config.atlas_path.as_deref().map(normalize_source);
        if config.atlas_path != self.config.atlas_path {
            match load_atlas(&mut self.renderer, config.atlas_path.as_deref()) {
                Ok(atlas) => {
                    pool::apply(&mut self.pool, Command::Clear, &mut self.events);
                    self.admission.reset_history();
                    tracing::info!(
                        path = ?config.atlas_path,
                        sprites = atlas.len(),
                        "sprite atlas replaced"
                    );
                    active.atlas = atlas;
                }
                Err(error) => {
                    tracing::warn!(
                        path = ?config.atlas_path,
                        error = %format!("{error:#}"),
                        "keeping previous sprite atlas"
                    );
                    self.stats.swaps_rejected += 1;
                    config.atlas_path = self.config.atlas_path.clone();
                }
            }
        }

        active.selector =
            WeightedSelector::build(&active.atlas, &config.emoji, &config.emoji_weighted);
        self.admission.set_rate_limit(config.rate_limit);
        self.spawning
            .reconfigure(SpawnConfig::new(config.min_px, config.max_px));
        self.config = config;
        self.frame_interval = self.resolve_frame_interval();
        self.stats.swaps_applied += 1;
        tracing::debug!(
            strategy = ?self.config.strategy,
            rate_limit = self.config.rate_limit,
            "configuration applied"
        );
    }

    fn admit_requests(&mut self, now: Instant) {
        let requests = self.handle.shared().drain_requests();
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let elapsed = self.clock.since_origin(now);

        for request in requests {
            match self.admission.admit(elapsed, query::live_count(&self.pool)) {
                Verdict::Admitted => self.stats.admitted += 1,
                Verdict::RejectedCapacity => {
                    self.stats.rejected_capacity += 1;
                    continue;
                }
                Verdict::RejectedRate => {
                    self.stats.rejected_rate += 1;
                    continue;
                }
            }

            let (topology, viewport) = query_topology(&self.platform);
            let position =
                self.placement
                    .sample(self.config.strategy, &topology, request.position, &mut self.rng);
            let sprite = request
                .sprite
                .filter(|sprite| sprite.index() < active.atlas.len())
                .unwrap_or_else(|| active.selector.sample(&mut self.rng));

            self.spawning.handle(
                &[Placement { sprite, position }],
                viewport.height(),
                &mut self.rng,
                &mut self.commands,
            );
            for command in self.commands.drain(..) {
                pool::apply(&mut self.pool, command, &mut self.events);
            }
        }
    }

    fn present(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let frame = Frame::new(query::badge_view(&self.pool), active.atlas.uvs().to_vec());
        if let Err(error) = self.renderer.render(&frame) {
            tracing::warn!(error = %format!("{error:#}"), "frame render failed");
        }
        self.stats.frames += 1;
    }

    fn resolve_frame_interval(&self) -> Duration {
        let fps = match self.config.fps_mode {
            FpsMode::Fixed => self.config.fps_fixed,
            FpsMode::Auto => match self.platform.refresh_rate() {
                Ok(rate) if rate > 0 => rate,
                Ok(_) => DEFAULT_FPS,
                Err(error) => {
                    tracing::debug!(%error, "refresh rate unavailable");
                    DEFAULT_FPS
                }
            },
        };
        interval_for(fps)
    }
}

impl<R, P> Overlay<R, P>
where
    R: Renderer + Send + 'static,
    P: PlatformLayer + Send + 'static,
{
    /// Runs the frame loop on a dedicated thread.
    pub fn spawn(self) -> Result<OverlayThread<R, P>, EngineError> {
        self.expect_state("spawn", EngineState::Initialized)?;
        let handle = self.handle();
        let join = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || {
                let mut overlay = self;
                let outcome = overlay.run();
                (overlay, outcome)
            })
            .map_err(EngineError::ThreadSpawn)?;
        Ok(OverlayThread { handle, join })
    }
}

type LoopOutcome<R, P> = (Overlay<R, P>, Result<(), EngineError>);

/// Overlay running on its own thread.
pub struct OverlayThread<R, P> {
    handle: EngineHandle,
    join: JoinHandle<LoopOutcome<R, P>>,
}

impl<R, P> OverlayThread<R, P>
where
    R: Renderer,
    P: PlatformLayer,
{
    /// Handle of the running overlay.
    #[must_use]
    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// Whether the loop thread has exited on its own.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Requests stop, waits for the loop to exit, then releases resources.
    pub fn shutdown(self) -> Result<EngineStats, EngineError> {
        self.handle.stop();
        let (overlay, outcome) = self.join.join().map_err(|_| EngineError::ThreadPanicked)?;
        let stats = overlay.shutdown();
        outcome.map(|()| stats)
    }
}

fn load_atlas<R: Renderer>(renderer: &mut R, path: Option<&Path>) -> anyhow::Result<SpriteAtlas> {
    let atlas = SpriteAtlas::load(path).context("failed to load the new atlas")?;
    renderer
        .upload_atlas(&atlas)
        .context("renderer rejected the new atlas")?;
    Ok(atlas)
}

/// Queries the platform, substituting safe defaults for anything unknown.
fn query_topology<P: PlatformLayer>(platform: &P) -> (Topology, Viewport) {
    let viewport = platform.viewport().unwrap_or_else(|error| {
        tracing::debug!(%error, "viewport unavailable");
        Viewport::default()
    });
    let monitors = match platform.monitors() {
        Ok(monitors) if !monitors.is_empty() => monitors,
        Ok(_) => vec![viewport.as_monitor()],
        Err(error) => {
            tracing::debug!(%error, "monitor topology unavailable");
            vec![viewport.as_monitor()]
        }
    };
    let caret = platform.caret_position().unwrap_or_else(|error| {
        tracing::debug!(%error, "caret position unavailable");
        None
    });
    let foreground = platform.foreground_monitor().unwrap_or_else(|error| {
        tracing::debug!(%error, "foreground monitor unavailable");
        None
    });

    (
        Topology::new(monitors)
            .with_caret(caret)
            .with_foreground(foreground),
        viewport,
    )
}

fn interval_for(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(fps.max(1)))
}
