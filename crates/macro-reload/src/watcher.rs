//! Debounced watcher over the config directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, Debouncer};
use serde::Serialize;

use crate::error::WatchError;

const DEBOUNCE: Duration = Duration::from_millis(500);
const CONFIG_EXTENSION: &str = "cfg";

/// A config file was written, created or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigChange {
    /// Path relative to the config directory.
    pub path: String,
    pub deleted: bool,
}

pub struct ConfigWatcher {
    config_dir: PathBuf,
    sender: Sender<ConfigChange>,
    shutdown: Arc<AtomicBool>,
}

impl ConfigWatcher {
    pub fn new(config_dir: impl Into<PathBuf>, sender: Sender<ConfigChange>) -> Self {
        Self {
            config_dir: config_dir.into(),
            sender,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Blocks, forwarding `.cfg` changes until stopped or the receiver is
    /// dropped.
    pub fn watch(&self) -> Result<(), WatchError> {
        let (tx, rx) = std::sync::mpsc::channel();

        let mut debouncer: Debouncer<RecommendedWatcher> =
            new_debouncer(DEBOUNCE, tx).map_err(|e| self.error(e))?;
        debouncer
            .watcher()
            .watch(&self.config_dir, RecursiveMode::Recursive)
            .map_err(|e| self.error(e))?;

        log::info!("Watching {} for changes", self.config_dir.display());

        while !self.shutdown.load(Ordering::Relaxed) {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(Ok(events)) => {
                    let changes: Vec<ConfigChange> = events
                        .into_iter()
                        .filter_map(|event| self.change_for(&event.path))
                        .collect();
                    for change in changes {
                        if self.sender.send(change).is_err() {
                            return Err(WatchError::ChannelClosed);
                        }
                    }
                }
                Ok(Err(e)) => log::error!("Watch error: {}", e),
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        log::info!("Stopped watching {}", self.config_dir.display());
        Ok(())
    }

    fn error(&self, e: impl std::fmt::Display) -> WatchError {
        WatchError::Watch {
            path: self.config_dir.clone(),
            message: e.to_string(),
        }
    }

    fn change_for(&self, path: &Path) -> Option<ConfigChange> {
        if path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
            return None;
        }
        let relative = path.strip_prefix(&self.config_dir).unwrap_or(path);
        Some(ConfigChange {
            path: relative.to_string_lossy().to_string(),
            deleted: !path.exists(),
        })
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Runs a [`ConfigWatcher`] on its own thread.
pub struct WatcherThread {
    watcher: Arc<ConfigWatcher>,
    handle: Option<JoinHandle<Result<(), WatchError>>>,
}

impl WatcherThread {
    pub fn spawn(config_dir: impl Into<PathBuf>, sender: Sender<ConfigChange>) -> Self {
        let watcher = Arc::new(ConfigWatcher::new(config_dir, sender));
        let worker = Arc::clone(&watcher);
        let handle = std::thread::spawn(move || worker.watch());
        Self {
            watcher,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.watcher.stop();
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(Err(e)) => log::warn!("Config watcher ended with error: {}", e),
                Err(_) => log::error!("Config watcher thread panicked"),
                Ok(Ok(())) => {}
            }
        }
    }
}

impl Drop for WatcherThread {
    fn drop(&mut self) {
        self.stop();
    }
}
