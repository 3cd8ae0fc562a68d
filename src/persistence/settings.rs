use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph_utils::geometry::Bounds;

/// Point a zoom step scales about.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ZoomAnchor {
    // Canvas origin; content drifts away from the pointer
    Origin,
    // Keeps the point under the pointer fixed
    #[default]
    Cursor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // Relative paths resolve against the working directory
    pub data_file: PathBuf,
    pub zoom_anchor: ZoomAnchor,
    // Placement area used until the canvas reports its real size
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_file: Self::default_data_file(),
            zoom_anchor: ZoomAnchor::default(),
            canvas_width: 600.0,
            canvas_height: 400.0,
            window_width: 750.0,
            window_height: 450.0,
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Graph-Notes
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Graph-Notes");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Graph-Notes
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Graph-Notes");
            }
            return PathBuf::from("Graph-Notes");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Graph-Notes or ~/.config/Graph-Notes
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Graph-Notes");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Graph-Notes");
        }
    }

    pub fn default_data_file() -> PathBuf { PathBuf::from("graph_data.json") }

    /// Return the path of the settings file in the per-user config directory.
    pub fn settings_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    // Missing file means defaults; missing fields fall back individually
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let v: Self = serde_json::from_str(&s)?;
        log::debug!("settings loaded from {}", path.display());
        Ok(v)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn placement_bounds(&self) -> Bounds {
        Bounds::from_size(self.canvas_width, self.canvas_height)
    }
}
