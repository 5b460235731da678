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

//! Map tile fetching and caching.
//!
//! Tiles are downloaded on background threads, cached on disk under a SHA-256
//! file name, and uploaded as egui textures once decoded.

use egui::{ColorImage, TextureHandle};
use pinmap_core::{Viewport, MAX_TILE_ZOOM, TILE_SIZE};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

const CACHE_DURATION_DAYS: u64 = 7;
const USER_AGENT: &str = concat!("pinmap-desktop/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

/// URL template for a slippy-map tile server
#[derive(Debug, Clone)]
pub struct TileSource {
    template: String,
    subdomains: Vec<String>,
}

impl TileSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
        }
    }

    /// Get the tile URL, spreading requests over the subdomains
    pub fn url(&self, coord: TileCoord) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let index = (coord.x as usize + coord.y as usize) % self.subdomains.len();
            self.subdomains[index].as_str()
        };
        self.template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.zoom.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// Get cache filename based on hash of URL
fn cache_filename(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}.png", hasher.finalize())
}

pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

type TileMap = Arc<Mutex<HashMap<TileCoord, TileState>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TileManager {
    source: Arc<TileSource>,
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
    tiles: TileMap,
    download_queue: Arc<Mutex<HashSet<TileCoord>>>,
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("source", &self.source)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl TileManager {
    pub fn new(source: TileSource) -> Self {
        let cache_dir = Self::get_cache_dir();

        // Create cache directory if it doesn't exist
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            log::warn!("Failed to create tile cache directory {}: {e}", cache_dir.display());
        }

        // Clean up old tiles
        Self::cleanup_old_tiles(&cache_dir);

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build HTTP client, using defaults: {e}");
                reqwest::blocking::Client::new()
            });

        Self {
            source: Arc::new(source),
            cache_dir,
            client,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            download_queue: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn get_cache_dir() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("pinmap-desktop");
        path.push("tiles");
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        let Ok(entries) = fs::read_dir(cache_dir) else {
            return;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let expired = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);
            if expired && fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            log::info!("Removed {removed} expired tiles from cache");
        }
    }

    /// Get tile from cache or queue for download
    pub fn get_tile(&self, coord: TileCoord, ctx: &egui::Context) -> Option<TextureHandle> {
        match lock(&self.tiles).get(&coord) {
            Some(TileState::Loaded(texture)) => return Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => return None,
            None => {}
        }

        // Check if we have it in disk cache
        let url = self.source.url(coord);
        let cache_path = self.cache_dir.join(cache_filename(&url));
        if cache_path.exists() {
            let loaded = fs::read(&cache_path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| decode_tile(&bytes, coord, ctx).map_err(|e| e.to_string()));
            match loaded {
                Ok(texture) => {
                    lock(&self.tiles).insert(coord, TileState::Loaded(texture.clone()));
                    return Some(texture);
                }
                Err(e) => {
                    log::warn!("Failed to load cached tile {}: {e}", cache_path.display());
                }
            }
        }

        lock(&self.tiles).insert(coord, TileState::Loading);
        self.queue_download(coord, url, ctx.clone());
        None
    }

    fn queue_download(&self, coord: TileCoord, url: String, ctx: egui::Context) {
        if !lock(&self.download_queue).insert(coord) {
            return;
        }

        let tiles = self.tiles.clone();
        let queue = self.download_queue.clone();
        let cache_path = self.cache_dir.join(cache_filename(&url));
        let client = self.client.clone();

        std::thread::spawn(move || {
            let state = match Self::download_tile(&client, &url, &cache_path) {
                Ok(bytes) => match decode_tile(&bytes, coord, &ctx) {
                    Ok(texture) => TileState::Loaded(texture),
                    Err(e) => {
                        log::warn!("Failed to decode tile image {url}: {e}");
                        TileState::Failed
                    }
                },
                Err(e) => {
                    log::warn!("Failed to fetch tile {url}: {e}");
                    TileState::Failed
                }
            };
            lock(&tiles).insert(coord, state);
            lock(&queue).remove(&coord);
            ctx.request_repaint();
        });
    }

    fn download_tile(
        client: &reqwest::blocking::Client,
        url: &str,
        cache_path: &Path,
    ) -> Result<Vec<u8>, reqwest::Error> {
        log::debug!("Downloading tile: {url}");
        let bytes = client.get(url).send()?.error_for_status()?.bytes()?.to_vec();

        if let Err(e) = fs::write(cache_path, &bytes) {
            log::warn!("Failed to save tile to cache: {e}");
        }
        Ok(bytes)
    }

    pub fn has_loading_tiles(&self) -> bool {
        lock(&self.tiles)
            .values()
            .any(|state| matches!(state, TileState::Loading))
    }

    pub fn get_error_count(&self) -> usize {
        lock(&self.tiles)
            .values()
            .filter(|state| matches!(state, TileState::Failed))
            .count()
    }
}

fn decode_tile(
    bytes: &[u8],
    coord: TileCoord,
    ctx: &egui::Context,
) -> Result<TextureHandle, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());

    Ok(ctx.load_texture(
        format!("tile_{}_{}/{}", coord.zoom, coord.x, coord.y),
        color_image,
        egui::TextureOptions::default(),
    ))
}

/// Tiles covering the viewport, with each tile's offset from the viewport's
/// top-left corner in pixels.
pub fn get_visible_tiles(viewport: &Viewport) -> Vec<(TileCoord, f32, f32)> {
    if viewport.zoom > MAX_TILE_ZOOM {
        return Vec::new();
    }
    let (origin_x, origin_y) = viewport.origin();
    let max_tile = 1_i64 << viewport.zoom;

    let first_x = (origin_x / TILE_SIZE).floor() as i64;
    let first_y = (origin_y / TILE_SIZE).floor() as i64;
    let last_x = ((origin_x + viewport.width) / TILE_SIZE).floor() as i64;
    let last_y = ((origin_y + viewport.height) / TILE_SIZE).floor() as i64;

    let mut tiles = Vec::new();
    for tile_y in first_y.max(0)..=last_y.min(max_tile - 1) {
        for tile_x in first_x..=last_x {
            // Wrap X coordinate (longitude wraps around)
            let wrapped_x = tile_x.rem_euclid(max_tile);
            let (Ok(x), Ok(y)) = (u32::try_from(wrapped_x), u32::try_from(tile_y)) else {
                continue;
            };

            let offset_x = tile_x as f64 * TILE_SIZE - origin_x;
            let offset_y = tile_y as f64 * TILE_SIZE - origin_y;
            tiles.push((TileCoord::new(x, y, viewport.zoom), offset_x as f32, offset_y as f32));
        }
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinmap_core::LatLon;

    fn osm() -> TileSource {
        TileSource::new(
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
    }

    #[test]
    fn test_tile_url() {
        let source = osm();
        assert_eq!(
            source.url(TileCoord::new(2200, 1343, 12)),
            "https://a.tile.openstreetmap.org/12/2200/1343.png"
        );
        assert_eq!(
            source.url(TileCoord::new(1, 1, 1)),
            "https://c.tile.openstreetmap.org/1/1/1.png"
        );

        let single = TileSource::new("http://localhost/{z}/{x}/{y}.png", Vec::new());
        assert_eq!(single.url(TileCoord::new(3, 4, 5)), "http://localhost/5/3/4.png");
    }

    #[test]
    fn test_cache_filename_is_stable() {
        let a = cache_filename("https://a.tile.openstreetmap.org/1/0/0.png");
        let b = cache_filename("https://a.tile.openstreetmap.org/1/0/0.png");
        let c = cache_filename("https://b.tile.openstreetmap.org/1/0/0.png");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64 + 4);
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let viewport = Viewport {
            center: LatLon::new(52.39, 13.075),
            zoom: 12,
            width: 1000.0,
            height: 700.0,
        };
        let tiles = get_visible_tiles(&viewport);
        assert!(!tiles.is_empty());

        // The top-left tile starts at or before the corner, the last ends at or after.
        let min_x = tiles.iter().map(|t| t.1).fold(f32::MAX, f32::min);
        let min_y = tiles.iter().map(|t| t.2).fold(f32::MAX, f32::min);
        let max_x = tiles.iter().map(|t| t.1).fold(f32::MIN, f32::max) + 256.0;
        let max_y = tiles.iter().map(|t| t.2).fold(f32::MIN, f32::max) + 256.0;
        assert!(min_x <= 0.0 && min_y <= 0.0);
        assert!(max_x >= 1000.0 && max_y >= 700.0);
        assert!(tiles.iter().all(|(coord, _, _)| coord.zoom == 12));
    }

    #[test]
    fn test_no_tiles_beyond_tile_zoom_limit() {
        let viewport = Viewport {
            center: LatLon::new(52.39, 13.075),
            zoom: 70,
            width: 1024.0,
            height: 768.0,
        };
        assert!(get_visible_tiles(&viewport).is_empty());

        let deepest = Viewport {
            zoom: MAX_TILE_ZOOM,
            ..viewport
        };
        assert!(!get_visible_tiles(&deepest).is_empty());
    }

    #[test]
    fn test_visible_tiles_skip_rows_outside_world() {
        let viewport = Viewport {
            center: LatLon::new(0.0, 0.0),
            zoom: 0,
            width: 1024.0,
            height: 1024.0,
        };
        let tiles = get_visible_tiles(&viewport);
        assert!(tiles.iter().all(|(coord, _, _)| coord.x == 0 && coord.y == 0));
        // One row, repeated horizontally.
        assert!(tiles.len() >= 4);
    }
}
