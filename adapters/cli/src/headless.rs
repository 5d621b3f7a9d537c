//! Display-less stand-ins for the platform and renderer.

use std::time::Instant;

use anyhow::Result;
use glam::Vec2;
use lizard_hook_atlas::SpriteAtlas;
use lizard_hook_core::{virtual_desktop, MonitorBounds};
use lizard_hook_rendering::{Frame, PlatformError, PlatformLayer, Renderer, Viewport};

/// Serves a fixed monitor layout and closes once its deadline passes.
#[derive(Clone, Debug)]
pub(crate) struct HeadlessPlatform {
    monitors: Vec<MonitorBounds>,
    refresh_rate: Option<u32>,
    deadline: Option<Instant>,
}

impl HeadlessPlatform {
    /// Creates a platform over `monitors`, falling back to one full HD monitor.
    pub(crate) fn new(
        monitors: Vec<MonitorBounds>,
        refresh_rate: Option<u32>,
        deadline: Option<Instant>,
    ) -> Self {
        let monitors = if monitors.is_empty() {
            vec![Viewport::default().as_monitor()]
        } else {
            monitors
        };
        Self {
            monitors,
            refresh_rate,
            deadline,
        }
    }
}

impl PlatformLayer for HeadlessPlatform {
    fn monitors(&self) -> Result<Vec<MonitorBounds>, PlatformError> {
        Ok(self.monitors.clone())
    }

    fn caret_position(&self) -> Result<Option<Vec2>, PlatformError> {
        Err(PlatformError::Unavailable("caret tracking"))
    }

    fn foreground_monitor(&self) -> Result<Option<MonitorBounds>, PlatformError> {
        Ok(self.monitors.first().copied())
    }

    fn refresh_rate(&self) -> Result<u32, PlatformError> {
        self.refresh_rate
            .ok_or(PlatformError::Unavailable("refresh rate"))
    }

    fn viewport(&self) -> Result<Viewport, PlatformError> {
        virtual_desktop(&self.monitors)
            .map(|desktop| Viewport::new(desktop.width(), desktop.height()))
            .ok_or_else(|| PlatformError::Query("no monitors configured".to_owned()))
    }

    fn pump_events(&mut self) -> bool {
        self.deadline.map_or(true, |deadline| Instant::now() < deadline)
    }
}

/// Renderer that reports what it would draw through `tracing`.
#[derive(Debug, Default)]
pub(crate) struct LoggingRenderer {
    frames: u64,
    peak: usize,
}

impl Renderer for LoggingRenderer {
    fn upload_atlas(&mut self, atlas: &SpriteAtlas) -> Result<()> {
        let texture = atlas.texture();
        tracing::info!(
            sprites = atlas.len(),
            width = texture.width(),
            height = texture.height(),
            source = ?atlas.source(),
            "atlas uploaded"
        );
        Ok(())
    }

    fn render(&mut self, frame: &Frame) -> Result<()> {
        self.frames += 1;
        if frame.len() > self.peak {
            self.peak = frame.len();
            tracing::debug!(badges = self.peak, "new peak of live badges");
        }
        for instance in frame.instances() {
            tracing::trace!(?instance, "badge");
        }
        Ok(())
    }

    fn release(&mut self) {
        tracing::info!(frames = self.frames, peak = self.peak, "renderer released");
    }
}
