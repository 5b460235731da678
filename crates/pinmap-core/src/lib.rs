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

//! Drop-to-place map annotations.
//!
//! This library holds everything about the annotation board that does not need
//! a window: the bounded map surface and its pixel/geo conversion, the icon
//! registry, the drag session and drop shield, and markers whose comment popup
//! can be edited exactly once.
//!
//! - **Map layer** ([`geo`]): Web Mercator math and the bounded [`MapSurface`]
//! - **Icon layer** ([`icons`]): [`IconRegistry`] of marker styles
//! - **Drag layer** ([`shield`]): [`DragSession`] payload and the [`DropShield`]
//! - **Marker layer** ([`marker`], [`popup`]): markers and the edit-once popup
//! - **Board** ([`board`]): event handlers tying the layers together
//!
//! # Quick Start
//!
//! ```
//! use pinmap_core::{Board, BoundingRegion, DropOutcome, IconRegistry, LatLon, MapSurface};
//!
//! let bounds = BoundingRegion::new(LatLon::new(52.33, 12.95), LatLon::new(52.45, 13.20));
//! let map = MapSurface::new(bounds, LatLon::new(52.3906, 13.0645), 12, 19, 1024.0, 768.0);
//! let mut board = Board::new(IconRegistry::default(), map);
//!
//! board.drag_start("dog");
//! let outcome = board.drop(Some("dog"), 512.0, 384.0);
//! board.drag_end();
//!
//! let DropOutcome::Placed(id) = outcome else { unreachable!() };
//! if let Some(draft) = board.marker_mut(id).and_then(|m| m.editor_draft_mut()) {
//!     draft.push_str("Good dog");
//! }
//! board.save_comment(id).unwrap();
//! assert_eq!(board.marker(id).unwrap().comment(), "Good dog");
//! ```

pub mod board;
pub mod error;
pub mod geo;
pub mod icons;
pub mod marker;
pub mod popup;
pub mod shield;

pub use board::{Board, BoardEvent, DropOutcome};
pub use error::BoardError;
pub use geo::{BoundingRegion, LatLon, MapSurface, Viewport, WebMercator, MAX_TILE_ZOOM, TILE_SIZE};
pub use icons::{IconRegistry, IconStyle, IconType};
pub use marker::{Marker, MarkerId};
pub use popup::{escape_html, visible_comment, PopupContent, PopupForm, PopupState};
pub use shield::{DragSession, DropEffect, DropShield};
