//! Configuration file discovery, loading and change watching.

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use lizard_hook_core::OverlaySettings;
use lizard_hook_engine::EngineHandle;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;

/// Directory under the user's configuration root.
const CONFIG_DIR: &str = "lizard_hook";
/// File name of the configuration document.
const CONFIG_FILE: &str = "lizard.json";
/// Quiet period that ends a burst of events from one save.
const SETTLE: Duration = Duration::from_millis(100);

/// Contents of the configuration file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FileConfig {
    /// Log filter applied when neither `RUST_LOG` nor `--log-level` is set.
    pub(crate) logging_level: Option<String>,
    /// Badge engine settings; sibling keys of other subsystems are ignored.
    #[serde(flatten)]
    pub(crate) overlay: OverlaySettings,
}

/// Picks the configuration file, looking in the platform's per-user config directory.
pub(crate) fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_path_from(explicit, dirs::config_dir())
}

/// An explicit path always wins, even when the file is missing, so the
/// caller can report it. The per-user location is used only when present.
pub(crate) fn resolve_path_from(
    explicit: Option<&Path>,
    config_root: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    config_root
        .map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
        .filter(|candidate| candidate.is_file())
}

/// Reads and parses a configuration file.
pub(crate) fn load(path: &Path) -> Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

enum WatchMessage {
    Fs(notify::Result<Event>),
    Stop,
}

/// Republishes the configuration whenever the file changes on disk.
///
/// The directory holding the file is watched so editors that save by
/// replacing the file are still noticed.
pub(crate) struct ConfigWatcher {
    watcher: Option<RecommendedWatcher>,
    stop: Sender<WatchMessage>,
    join: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Starts watching `path`, forwarding every successfully parsed change to `handle`.
    pub(crate) fn spawn(path: PathBuf, handle: EngineHandle) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .with_context(|| format!("config path {} names no file", path.display()))?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::channel();
        let events = tx.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                let _ = events.send(WatchMessage::Fs(result));
            },
            notify::Config::default(),
        )
        .context("failed to create config watcher")?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", directory.display()))?;

        let join = thread::Builder::new()
            .name("lizard-hook-config".to_owned())
            .spawn(move || watch(&path, &file_name, &handle, &rx))
            .context("failed to start config watcher")?;
        tracing::debug!(directory = %directory.display(), "config watcher started");

        Ok(Self {
            watcher: Some(watcher),
            stop: tx,
            join: Some(join),
        })
    }

    /// Stops watching and waits for the worker thread.
    pub(crate) fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        let _ = self.stop.send(WatchMessage::Stop);
        drop(self.watcher.take());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("config watcher panicked");
            }
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.halt();
    }
}

fn watch(path: &Path, file_name: &OsStr, handle: &EngineHandle, rx: &Receiver<WatchMessage>) {
    loop {
        match rx.recv() {
            Ok(WatchMessage::Fs(Ok(event))) => {
                if !touches_config(&event, file_name) {
                    continue;
                }
                if !settle(rx) {
                    break;
                }
                publish(path, handle);
            }
            Ok(WatchMessage::Fs(Err(error))) => {
                tracing::warn!(%error, "config watcher error");
            }
            Ok(WatchMessage::Stop) | Err(_) => break,
        }
    }
    tracing::debug!("config watcher stopped");
}

/// Swallows the rest of a burst. Returns `false` when stop arrives meanwhile.
fn settle(rx: &Receiver<WatchMessage>) -> bool {
    loop {
        match rx.recv_timeout(SETTLE) {
            Ok(WatchMessage::Fs(_)) => {}
            Ok(WatchMessage::Stop) | Err(RecvTimeoutError::Disconnected) => return false,
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}

fn publish(path: &Path, handle: &EngineHandle) {
    match load(path) {
        Ok(file) => {
            tracing::info!(path = %path.display(), "config changed, publishing snapshot");
            handle.refresh_from_config(&file.overlay);
        }
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "ignoring unreadable config");
        }
    }
}

/// Whether `event` creates or modifies the watched file.
fn touches_config(event: &Event, file_name: &OsStr) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, time::Instant};

    use super::*;
    use crate::headless::{HeadlessPlatform, LoggingRenderer};
    use lizard_hook_core::SpawnStrategy;
    use lizard_hook_engine::{EngineOptions, Overlay};
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().expect("config has a parent")).expect("config dir");
        fs::write(path, text).expect("config written");
    }

    #[test]
    fn explicit_path_wins_even_when_missing() {
        let resolved = resolve_path_from(
            Some(Path::new("nowhere/lizard.json")),
            Some(PathBuf::from("/tmp")),
        );
        assert_eq!(resolved, Some(PathBuf::from("nowhere/lizard.json")));
    }

    #[test]
    fn config_directory_file_is_found() {
        let root = tempfile::tempdir().expect("tempdir");
        let file = root.path().join(CONFIG_DIR).join(CONFIG_FILE);
        write(&file, "{}");

        let resolved = resolve_path_from(None, Some(root.path().to_path_buf()));
        assert_eq!(resolved, Some(file));
    }

    #[test]
    fn no_file_anywhere_means_defaults() {
        let empty = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            resolve_path_from(None, Some(empty.path().to_path_buf())),
            None
        );
        assert_eq!(resolve_path_from(None, None), None);
    }

    #[test]
    fn file_config_reads_logging_level_beside_overlay_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        write(
            &path,
            r#"{
                "logging_level": "debug",
                "badge_spawn_strategy": "near_caret",
                "badges_per_second_max": 3,
                "sound_volume": 0.4
            }"#,
        );

        let file = load(&path).expect("config loads");

        assert_eq!(file.logging_level.as_deref(), Some("debug"));
        assert_eq!(file.overlay.badge_spawn_strategy, SpawnStrategy::NearCaret);
        assert_eq!(file.overlay.badges_per_second_max, 3);
        assert_eq!(file.overlay.badge_min_px, 60);
    }

    #[test]
    fn malformed_config_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        write(&path, "{ not json");

        let error = load(&path).expect_err("parse fails");
        assert!(format!("{error:#}").contains(CONFIG_FILE));
    }

    #[test]
    fn only_writes_to_the_config_file_count() {
        let name = OsString::from(CONFIG_FILE);
        let config = PathBuf::from("/cfg").join(CONFIG_FILE);
        let modified =
            Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(config.clone());
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(config.clone());
        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(config);
        let sibling = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/cfg/other.json".into());

        assert!(touches_config(&modified, &name));
        assert!(touches_config(&created, &name));
        assert!(!touches_config(&removed, &name));
        assert!(!touches_config(&sibling, &name));
    }

    #[test]
    fn edits_on_disk_publish_a_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        write(&path, "{}");
        let overlay = Overlay::new(
            LoggingRenderer::default(),
            HeadlessPlatform::new(Vec::new(), None, None),
            &OverlaySettings::default(),
            EngineOptions::default(),
        );
        let handle = overlay.handle();

        let watcher = ConfigWatcher::spawn(path.clone(), handle.clone()).expect("watcher starts");
        write(&path, r#"{ "badges_per_second_max": 3 }"#);
        write(&path, r#"{ "badges_per_second_max": 4 }"#);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !handle.has_pending_config() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        watcher.stop();

        assert!(handle.has_pending_config());
    }
}
