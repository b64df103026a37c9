// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewer settings.
//!
//! Stored as RON. Files written by a newer viewer are rejected instead of
//! being silently misread.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use triggerflow_graph::GraphStyle;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the file failed
    #[error("Settings IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid settings RON
    #[error("Invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing the settings failed
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// The file comes from a newer viewer
    #[error("Settings version {found} is newer than supported version {supported}")]
    NewerVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },
}

/// Window, watcher and drawing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Settings format version
    pub format_version: u32,
    /// Initial window size in logical pixels
    pub window_size: [u32; 2],
    /// Quiet period before a scene file change is reloaded
    pub watch_debounce_ms: u64,
    /// Graph drawing style
    pub style: GraphStyle,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            format_version: SETTINGS_FORMAT_VERSION,
            window_size: [1280, 800],
            watch_debounce_ms: 250,
            style: GraphStyle::default(),
        }
    }
}

impl ViewerSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        let settings: ViewerSettings = ron::from_str(text)?;
        if settings.format_version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::NewerVersion {
                found: settings.format_version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        Ok(settings)
    }

    /// Render settings as pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let settings = Self::from_ron(&std::fs::read_to_string(path)?)?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Wrote settings to {}", path.display());
        Ok(())
    }

    /// Watcher debounce as a duration
    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }
}
