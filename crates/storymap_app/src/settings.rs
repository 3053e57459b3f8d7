// SPDX-License-Identifier: MIT OR Apache-2.0
//! User settings, stored as RON in the data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storymap_graph::binding::DEFAULT_BINDING_INSET;
use storymap_graph::{Graph, LabelStyle};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.ron";

/// Editing and persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings format version
    pub version: u32,
    /// Close every annotation bubble and clear the selection when empty
    /// canvas is clicked
    pub close_objects_on_canvas_click: bool,
    /// Scale factor applied per wheel notch
    pub zoom_step: f32,
    /// Smallest allowed zoom
    pub min_scale: f32,
    /// Largest allowed zoom
    pub max_scale: f32,
    /// Node label sizing
    pub label: LabelStyle,
    /// Horizontal inset of left/right binding points
    pub binding_inset: f32,
    /// Store key of the graph document
    pub graph_key: String,
    /// Store key of the view document
    pub view_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            close_objects_on_canvas_click: false,
            zoom_step: 1.05,
            min_scale: 0.1,
            max_scale: 10.0,
            label: LabelStyle::default(),
            binding_inset: DEFAULT_BINDING_INSET,
            graph_key: "canvasData".to_string(),
            view_key: "canvasViewState".to_string(),
        }
    }
}

/// Error when loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Filesystem failure
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The settings could not be written as RON
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// The file was written by a newer version
    #[error("Settings version {found} is newer than supported version {}", SETTINGS_FORMAT_VERSION)]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
    },
}

impl Settings {
    /// Settings file path for a data directory
    pub fn file_path(data_dir: &Path) -> PathBuf {
        data_dir.join(SETTINGS_FILE_NAME)
    }

    /// Load settings from a file, falling back to defaults when it does
    /// not exist
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let settings: Settings = ron::from_str(&content)?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
            });
        }
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Empty graph using these label and binding parameters
    pub fn new_graph(&self) -> Graph {
        Graph::with_style(self.label, self.binding_inset)
    }
}
