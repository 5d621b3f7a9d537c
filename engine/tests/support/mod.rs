#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use glam::Vec2;
use image::{Rgba, RgbaImage};
use lizard_hook_atlas::SpriteAtlas;
use lizard_hook_core::{MonitorBounds, OverlaySettings};
use lizard_hook_engine::{EngineOptions, Overlay};
use lizard_hook_rendering::{Frame, PlatformError, PlatformLayer, Renderer, Viewport};

pub const FULL_HD: MonitorBounds = MonitorBounds::new(0, 0, 1920, 1080);
pub const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Default)]
pub struct Recording {
    pub uploads: Vec<Option<PathBuf>>,
    pub frames: Vec<usize>,
    pub released: bool,
    pub fail_uploads: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Recorder(Arc<Mutex<Recording>>);

impl Recorder {
    pub fn with<T>(&self, read: impl FnOnce(&mut Recording) -> T) -> T {
        let mut recording = self.0.lock().expect("recording lock");
        read(&mut recording)
    }
}

#[derive(Debug)]
pub struct FakeRenderer {
    recorder: Recorder,
}

impl FakeRenderer {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

impl Renderer for FakeRenderer {
    fn upload_atlas(&mut self, atlas: &SpriteAtlas) -> anyhow::Result<()> {
        self.recorder.with(|recording| {
            if recording.fail_uploads {
                anyhow::bail!("texture upload refused");
            }
            recording.uploads.push(atlas.source().map(Path::to_path_buf));
            Ok(())
        })
    }

    fn render(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.recorder.with(|recording| recording.frames.push(frame.len()));
        Ok(())
    }

    fn release(&mut self) {
        self.recorder.with(|recording| recording.released = true);
    }
}

#[derive(Clone, Debug)]
pub struct FakePlatform {
    pub monitors: Option<Vec<MonitorBounds>>,
    pub caret: Option<Vec2>,
    pub foreground: Option<MonitorBounds>,
    pub refresh_rate: Option<u32>,
    pub viewport: Viewport,
    pub open: bool,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            monitors: Some(vec![FULL_HD]),
            caret: None,
            foreground: None,
            refresh_rate: Some(60),
            viewport: Viewport::new(1920, 1080),
            open: true,
        }
    }
}

impl PlatformLayer for FakePlatform {
    fn monitors(&self) -> Result<Vec<MonitorBounds>, PlatformError> {
        self.monitors
            .clone()
            .ok_or_else(|| PlatformError::Query("no display server".to_owned()))
    }

    fn caret_position(&self) -> Result<Option<Vec2>, PlatformError> {
        match self.caret {
            Some(caret) => Ok(Some(caret)),
            None => Err(PlatformError::Unavailable("caret tracking")),
        }
    }

    fn foreground_monitor(&self) -> Result<Option<MonitorBounds>, PlatformError> {
        Ok(self.foreground)
    }

    fn refresh_rate(&self) -> Result<u32, PlatformError> {
        self.refresh_rate
            .ok_or(PlatformError::Unavailable("refresh rate"))
    }

    fn viewport(&self) -> Result<Viewport, PlatformError> {
        Ok(self.viewport)
    }

    fn pump_events(&mut self) -> bool {
        self.open
    }
}

pub type TestOverlay = Overlay<FakeRenderer, FakePlatform>;

pub fn settings() -> OverlaySettings {
    OverlaySettings {
        badges_per_second_max: 0,
        ..OverlaySettings::default()
    }
}

pub fn options(seed: u64) -> EngineOptions {
    EngineOptions {
        rng_seed: Some(seed),
        ..EngineOptions::default()
    }
}

/// Builds, initializes and starts an overlay, returning it with its start instant.
pub fn running(
    settings: &OverlaySettings,
    platform: FakePlatform,
    options: EngineOptions,
) -> (TestOverlay, Recorder, Instant) {
    let recorder = Recorder::default();
    let mut overlay = Overlay::new(
        FakeRenderer::new(recorder.clone()),
        platform,
        settings,
        options,
    );
    overlay.init().expect("overlay initializes");
    let start = Instant::now();
    overlay.start(start).expect("overlay starts");
    (overlay, recorder, start)
}

pub fn write_atlas(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(8, 8, Rgba([10, 200, 30, 255]))
        .save(&path)
        .expect("fixture atlas saves");
    path
}

pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"not an image").expect("fixture writes");
    path
}
