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

//! Map surface geometry.
//!
//! Web Mercator projection, the viewport that converts between map pixels and
//! geographic coordinates, and the bounded map surface that keeps the view
//! inside a fixed region and never zooms out past the fitted view.

use serde::{Deserialize, Serialize};

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Deepest zoom level any slippy-map tile server serves.
pub const MAX_TILE_ZOOM: u8 = 22;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Fixed rectangular region that constrains the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    south_west: LatLon,
    north_east: LatLon,
}

impl BoundingRegion {
    /// Build a region from any two opposite corners.
    #[must_use]
    pub fn new(a: LatLon, b: LatLon) -> Self {
        Self {
            south_west: LatLon::new(a.lat.min(b.lat), a.lon.min(b.lon)),
            north_east: LatLon::new(a.lat.max(b.lat), a.lon.max(b.lon)),
        }
    }

    #[must_use]
    pub fn south_west(&self) -> LatLon {
        self.south_west
    }

    #[must_use]
    pub fn north_east(&self) -> LatLon {
        self.north_east
    }

    /// Whether the coordinate lies inside the region (edges included).
    #[must_use]
    pub fn contains(&self, point: LatLon) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&point.lon)
    }

    /// Projected pixel rectangle `(min_x, min_y, max_x, max_y)` at `zoom`.
    fn pixel_bounds(&self, zoom: u8) -> (f64, f64, f64, f64) {
        let north_west = LatLon::new(self.north_east.lat, self.south_west.lon);
        let south_east = LatLon::new(self.south_west.lat, self.north_east.lon);
        let (min_x, min_y) = WebMercator::project(north_west, zoom);
        let (max_x, max_y) = WebMercator::project(south_east, zoom);
        (min_x, min_y, max_x, max_y)
    }

    /// Centre of the region in projected space.
    #[must_use]
    pub fn projected_center(&self) -> LatLon {
        // Any zoom works, the projection is linear in 2^zoom.
        let (min_x, min_y, max_x, max_y) = self.pixel_bounds(0);
        WebMercator::unproject((min_x + max_x) / 2.0, (min_y + max_y) / 2.0, 0)
    }
}

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to Web Mercator Y coordinate in tile units
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.to_radians();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * Self::scale(zoom)
    }

    /// Convert longitude to Web Mercator X coordinate in tile units
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        ((lon + 180.0) / 360.0) * Self::scale(zoom)
    }

    /// Convert tile coordinates back to latitude
    #[must_use]
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = Self::scale(zoom);
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// Convert tile coordinates back to longitude
    #[must_use]
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        x / Self::scale(zoom) * 360.0 - 180.0
    }

    /// Absolute pixel position of a coordinate in the world map at `zoom`.
    #[must_use]
    pub fn project(point: LatLon, zoom: u8) -> (f64, f64) {
        (
            Self::lon_to_x(point.lon, zoom) * TILE_SIZE,
            Self::lat_to_y(point.lat, zoom) * TILE_SIZE,
        )
    }

    /// Inverse of [`WebMercator::project`].
    #[must_use]
    pub fn unproject(x: f64, y: f64, zoom: u8) -> LatLon {
        LatLon::new(
            Self::tile_to_lat(y / TILE_SIZE, zoom),
            Self::tile_to_lon(x / TILE_SIZE, zoom),
        )
    }

    fn scale(zoom: u8) -> f64 {
        2_f64.powi(i32::from(zoom))
    }
}

/// The visible part of the map: a centre, a zoom level and a pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: u8,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Geographic coordinate under a pixel relative to the map's top-left corner.
    #[must_use]
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> LatLon {
        let (cx, cy) = WebMercator::project(self.center, self.zoom);
        WebMercator::unproject(
            cx + x - self.width / 2.0,
            cy + y - self.height / 2.0,
            self.zoom,
        )
    }

    /// Pixel relative to the map's top-left corner for a geographic coordinate.
    #[must_use]
    pub fn geo_to_pixel(&self, point: LatLon) -> (f64, f64) {
        let (cx, cy) = WebMercator::project(self.center, self.zoom);
        let (px, py) = WebMercator::project(point, self.zoom);
        (px - cx + self.width / 2.0, py - cy + self.height / 2.0)
    }

    /// Absolute world pixel of the viewport's top-left corner.
    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        let (cx, cy) = WebMercator::project(self.center, self.zoom);
        (cx - self.width / 2.0, cy - self.height / 2.0)
    }

    fn has_area(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }
}

/// Tile map view locked to a [`BoundingRegion`].
///
/// The first time the surface gets a real size it fits the region and pins the
/// minimum zoom to the fitted level. Every pan, zoom and resize afterwards is
/// followed by an immediate, non-animated correction back inside the region.
#[derive(Debug, Clone)]
pub struct MapSurface {
    bounds: BoundingRegion,
    viewport: Viewport,
    min_zoom: u8,
    max_zoom: u8,
    fitted: bool,
}

impl MapSurface {
    /// Start at the given view, then fit `bounds` as soon as the size allows.
    #[must_use]
    pub fn new(
        bounds: BoundingRegion,
        initial_center: LatLon,
        initial_zoom: u8,
        max_zoom: u8,
        width: f64,
        height: f64,
    ) -> Self {
        let max_zoom = max_zoom.min(MAX_TILE_ZOOM);
        let initial_zoom = initial_zoom.min(max_zoom);
        let mut surface = Self {
            bounds,
            viewport: Viewport {
                center: initial_center,
                zoom: initial_zoom,
                width,
                height,
            },
            min_zoom: initial_zoom,
            max_zoom,
            fitted: false,
        };
        surface.fit_if_needed();
        surface
    }

    #[must_use]
    pub fn bounds(&self) -> &BoundingRegion {
        &self.bounds
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.viewport.zoom
    }

    #[must_use]
    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    #[must_use]
    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    #[must_use]
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> LatLon {
        self.viewport.pixel_to_geo(x, y)
    }

    #[must_use]
    pub fn geo_to_pixel(&self, point: LatLon) -> (f64, f64) {
        self.viewport.geo_to_pixel(point)
    }

    /// Largest zoom at which the whole region fits the viewport.
    #[must_use]
    pub fn bounds_zoom(&self) -> u8 {
        (0..=self.max_zoom)
            .rev()
            .find(|&zoom| {
                let (min_x, min_y, max_x, max_y) = self.bounds.pixel_bounds(zoom);
                max_x - min_x <= self.viewport.width && max_y - min_y <= self.viewport.height
            })
            .unwrap_or(0)
    }

    fn fit_if_needed(&mut self) {
        if self.fitted || !self.viewport.has_area() {
            return;
        }
        let zoom = self.bounds_zoom();
        self.viewport.zoom = zoom;
        self.viewport.center = self.bounds.projected_center();
        self.min_zoom = zoom;
        self.fitted = true;
        log::debug!("Fitted map to bounds at zoom {zoom}");
        self.pan_inside_bounds();
    }

    /// Track a new pixel size. Fits the region on the first usable size.
    pub fn resize(&mut self, width: f64, height: f64) {
        if (self.viewport.width - width).abs() < f64::EPSILON
            && (self.viewport.height - height).abs() < f64::EPSILON
        {
            return;
        }
        self.viewport.width = width;
        self.viewport.height = height;
        if self.fitted {
            self.pan_inside_bounds();
        } else {
            self.fit_if_needed();
        }
    }

    /// Move the map content by a pointer drag delta, then clamp.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let zoom = self.viewport.zoom;
        let (cx, cy) = WebMercator::project(self.viewport.center, zoom);
        self.viewport.center = WebMercator::unproject(cx - dx, cy - dy, zoom);
        self.pan_inside_bounds();
    }

    /// Change zoom by whole steps within `[min_zoom, max_zoom]`.
    /// Returns whether the zoom level changed.
    pub fn zoom_by(&mut self, steps: i32) -> bool {
        let target = (i32::from(self.viewport.zoom) + steps)
            .clamp(i32::from(self.min_zoom), i32::from(self.max_zoom));
        let target = u8::try_from(target).unwrap_or(self.min_zoom);
        if target == self.viewport.zoom {
            return false;
        }
        self.viewport.zoom = target;
        self.pan_inside_bounds();
        true
    }

    /// Force the viewport back inside the region.
    ///
    /// On an axis where the viewport is wider than the region the view is
    /// centred on the region instead.
    pub fn pan_inside_bounds(&mut self) {
        let zoom = self.viewport.zoom;
        let (min_x, min_y, max_x, max_y) = self.bounds.pixel_bounds(zoom);
        let (cx, cy) = WebMercator::project(self.viewport.center, zoom);
        let x = clamp_axis(cx, min_x, max_x, self.viewport.width / 2.0);
        let y = clamp_axis(cy, min_y, max_y, self.viewport.height / 2.0);
        if (x - cx).abs() > f64::EPSILON || (y - cy).abs() > f64::EPSILON {
            self.viewport.center = WebMercator::unproject(x, y, zoom);
        }
    }
}

fn clamp_axis(center: f64, low: f64, high: f64, half_extent: f64) -> f64 {
    if high - low <= half_extent * 2.0 {
        (low + high) / 2.0
    } else {
        center.clamp(low + half_extent, high - half_extent)
    }
}
