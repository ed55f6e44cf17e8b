//! Player preferences
//!
//! Persisted as `settings.json` next to the game, separately from high
//! scores.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Camera ===
    /// Added to the base zoom step per scroll notch
    pub scroll_sensitivity: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// World units drawn beyond the screen edge
    pub frame_margin: f32,

    // === Content ===
    /// Mod directories layered over the base catalog, in order
    pub mods: Vec<PathBuf>,

    // === Look ===
    pub ui_color: Rgba,
    pub background: Rgba,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scroll_sensitivity: 0.0,
            zoom_min: 0.5,
            zoom_max: 3.0,
            frame_margin: 100.0,

            mods: Vec::new(),

            ui_color: Rgba::WHITE,
            background: Rgba::BLACK,
        }
    }
}

impl Settings {
    /// Default file name
    pub const FILE_NAME: &'static str = "settings.json";

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                log::info!("Using default settings ({}: {})", path.display(), err);
                return Self::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Ignoring malformed {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Save settings to `path`
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Zoom range as (min, max), tolerating swapped bounds
    pub fn zoom_range(&self) -> (f32, f32) {
        (
            self.zoom_min.min(self.zoom_max),
            self.zoom_min.max(self.zoom_max),
        )
    }
}
