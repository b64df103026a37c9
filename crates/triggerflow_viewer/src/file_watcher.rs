// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debounced watching of the open scene file.
//!
//! The containing directory is watched rather than the file itself, since
//! many editors save by replacing the file.

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

/// Events emitted by the scene watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// The file was written or recreated
    Changed,
    /// The file was deleted
    Removed,
    /// The watcher reported an error
    Error(String),
}

/// Watches a single scene file
pub struct SceneWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    event_rx: Receiver<SceneEvent>,
    path: PathBuf,
}

impl SceneWatcher {
    /// Start watching `path`, reporting changes after `debounce` of quiet
    pub fn new(path: &Path, debounce: Duration) -> Result<Self, notify::Error> {
        let path = std::fs::canonicalize(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let file_name = path.file_name().map(OsString::from).unwrap_or_default();
        let (event_tx, event_rx) = mpsc::channel();

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if !event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                            continue;
                        }
                        if let Some(scene_event) = classify(&event.kind) {
                            let _ = event_tx.send(scene_event);
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = event_tx.send(SceneEvent::Error(error.to_string()));
                    }
                }
            }
        })?;

        debouncer.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching scene file for changes: {}", path.display());

        Ok(Self {
            _debouncer: debouncer,
            event_rx,
            path,
        })
    }

    /// Watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending events (non-blocking), keeping the one that matters most.
    ///
    /// An error outranks a change, a change outranks a removal since saving
    /// by replacement reports both.
    pub fn poll(&self) -> Option<SceneEvent> {
        let mut latest: Option<SceneEvent> = None;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => latest = Some(merge(latest, event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Scene watcher channel disconnected");
                    break;
                }
            }
        }
        latest
    }
}

fn classify(kind: &EventKind) -> Option<SceneEvent> {
    match kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(SceneEvent::Changed),
        EventKind::Remove(_) => Some(SceneEvent::Removed),
        EventKind::Any | EventKind::Access(_) | EventKind::Other => None,
    }
}

fn merge(current: Option<SceneEvent>, next: SceneEvent) -> SceneEvent {
    match (current, next) {
        (Some(error @ SceneEvent::Error(_)), _) | (_, error @ SceneEvent::Error(_)) => error,
        (Some(SceneEvent::Changed), _) | (_, SceneEvent::Changed) => SceneEvent::Changed,
        _ => SceneEvent::Removed,
    }
}
