// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Configuration is stored in TOML format through `confy` and read once at
//! startup. The map region, tile source and icon asset location come from
//! here; nothing in it changes while the app runs.

use std::path::PathBuf;

use pinmap_core::{BoundingRegion, LatLon, MapSurface, MAX_TILE_ZOOM};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "pinmap-desktop";
const CONFIG_NAME: &str = "config";

/// Default tile server (OpenStreetMap standard layer)
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Tile URL template with `{s}`, `{z}`, `{x}` and `{y}` placeholders
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    /// Subdomains substituted for `{s}`
    #[serde(default = "default_tile_subdomains")]
    pub tile_subdomains: Vec<String>,

    /// Attribution text required by the tile source
    #[serde(default = "default_attribution")]
    pub attribution: String,

    #[serde(default = "default_attribution_url")]
    pub attribution_url: String,

    /// Region the map may never leave
    #[serde(default = "default_bounds")]
    pub bounds: BoundingRegion,

    /// View used until the window has a size and the region can be fitted
    #[serde(default = "default_initial_center")]
    pub initial_center: LatLon,

    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u8,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,

    /// Directory holding the marker icon images
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,

    #[serde(default = "default_window_width")]
    pub window_width: f32,

    #[serde(default = "default_window_height")]
    pub window_height: f32,

    /// Icon palette panel width in pixels
    #[serde(default = "default_palette_width")]
    pub palette_width: f32,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_tile_url() -> String {
    DEFAULT_TILE_URL.to_string()
}

fn default_tile_subdomains() -> Vec<String> {
    ["a", "b", "c"].iter().map(ToString::to_string).collect()
}

fn default_attribution() -> String {
    "© OpenStreetMap contributors".to_string()
}

fn default_attribution_url() -> String {
    "https://www.openstreetmap.org/copyright".to_string()
}

fn default_bounds() -> BoundingRegion {
    BoundingRegion::new(LatLon::new(52.33, 12.95), LatLon::new(52.45, 13.20))
}

fn default_initial_center() -> LatLon {
    LatLon::new(52.3906, 13.0645)
}

fn default_initial_zoom() -> u8 {
    12
}

fn default_max_zoom() -> u8 {
    19
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_window_width() -> f32 {
    1280.0
}

fn default_window_height() -> f32 {
    800.0
}

fn default_palette_width() -> f32 {
    140.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            tile_url: default_tile_url(),
            tile_subdomains: default_tile_subdomains(),
            attribution: default_attribution(),
            attribution_url: default_attribution_url(),
            bounds: default_bounds(),
            initial_center: default_initial_center(),
            initial_zoom: default_initial_zoom(),
            max_zoom: default_max_zoom(),
            asset_dir: default_asset_dir(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            palette_width: default_palette_width(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Load configuration, falling back to defaults if the file is unreadable
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load configuration, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Map surface for the configured region. Fits once it has a size.
    pub fn map_surface(&self) -> MapSurface {
        if self.max_zoom > MAX_TILE_ZOOM {
            log::warn!(
                "max_zoom {} is beyond what tile servers provide, using {MAX_TILE_ZOOM}",
                self.max_zoom
            );
        }
        MapSurface::new(
            self.bounds,
            self.initial_center,
            self.initial_zoom,
            self.max_zoom.min(MAX_TILE_ZOOM),
            0.0,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.tile_subdomains, ["a", "b", "c"]);
        assert_eq!(config.bounds.south_west(), LatLon::new(52.33, 12.95));
        assert_eq!(config.bounds.north_east(), LatLon::new(52.45, 13.20));

        let map = config.map_surface();
        assert_eq!(map.zoom(), 12);
        assert_eq!(map.max_zoom(), 19);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = load_from_toml("max_zoom = 17\nasset_dir = \"icons\"\n");
        assert_eq!(config.max_zoom, 17);
        assert_eq!(config.asset_dir, PathBuf::from("icons"));
        assert_eq!(config.tile_url, DEFAULT_TILE_URL);
        assert_eq!(config.initial_zoom, 12);
    }

    #[test]
    fn test_oversized_max_zoom_is_capped() {
        let config: AppConfig = load_from_toml("max_zoom = 70\ninitial_zoom = 40\n");
        assert_eq!(config.max_zoom, 70);

        let mut map = config.map_surface();
        assert_eq!(map.max_zoom(), MAX_TILE_ZOOM);
        map.resize(1024.0, 768.0);
        map.zoom_by(100);
        assert_eq!(map.zoom(), MAX_TILE_ZOOM);
    }

    fn load_from_toml(text: &str) -> AppConfig {
        let dir = std::env::temp_dir().join(format!("pinmap-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, text).unwrap();
        let config = confy::load_path(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        config
    }
}
