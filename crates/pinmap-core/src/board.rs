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

//! Annotation board: drag sources, drop shield, map and markers wired together.
//!
//! Every handler runs to completion synchronously and records what it changed
//! as [`BoardEvent`]s, in order, for the UI to drain.

use log::{debug, info};

use crate::error::BoardError;
use crate::geo::{LatLon, MapSurface};
use crate::icons::{IconRegistry, IconType};
use crate::marker::{Marker, MarkerId};
use crate::popup::PopupForm;
use crate::shield::{DragSession, DropEffect, DropShield};

/// State change emitted by a board handler.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    DragStarted { icon: String },
    DragEnded,
    ShieldActivated,
    ShieldDeactivated,
    MarkerPlaced { id: MarkerId, icon: IconType, position: LatLon },
    DropIgnored { key: Option<String> },
    PopupOpened { id: MarkerId, form: PopupForm },
    PopupClosed { id: MarkerId },
    CommentSaved { id: MarkerId, comment: String },
}

/// Result of a drop on the shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Placed(MarkerId),
    Ignored,
}

#[derive(Debug)]
pub struct Board {
    registry: IconRegistry,
    map: MapSurface,
    shield: DropShield,
    drag: DragSession,
    markers: Vec<Marker>,
    events: Vec<BoardEvent>,
}

impl Board {
    #[must_use]
    pub fn new(registry: IconRegistry, map: MapSurface) -> Self {
        Self {
            registry,
            map,
            shield: DropShield::new(),
            drag: DragSession::new(),
            markers: Vec::new(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &IconRegistry {
        &self.registry
    }

    #[must_use]
    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    /// Pan, zoom and resize go straight to the map surface.
    pub fn map_mut(&mut self) -> &mut MapSurface {
        &mut self.map
    }

    #[must_use]
    pub fn shield(&self) -> &DropShield {
        &self.shield
    }

    #[must_use]
    pub fn drag_in_progress(&self) -> bool {
        self.drag.in_progress()
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    pub fn marker_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        self.markers.iter_mut().find(|m| m.id() == id)
    }

    /// Take all events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// A palette icon started dragging.
    pub fn drag_start(&mut self, icon_key: &str) -> DropEffect {
        let effect = self.drag.begin(icon_key);
        self.events.push(BoardEvent::DragStarted {
            icon: icon_key.to_string(),
        });
        if self.shield.activate() {
            self.events.push(BoardEvent::ShieldActivated);
        }
        effect
    }

    /// A drag is hovering the map.
    #[must_use]
    pub fn drag_over(&self) -> Option<DropEffect> {
        self.shield.drag_over()
    }

    /// The drag gesture finished, whatever the outcome.
    pub fn drag_end(&mut self) {
        self.drag.end();
        self.events.push(BoardEvent::DragEnded);
        self.deactivate_shield();
    }

    fn deactivate_shield(&mut self) {
        if self.shield.deactivate() {
            self.events.push(BoardEvent::ShieldDeactivated);
        }
    }

    /// A drag was released over the map at pixel `(x, y)` from its top-left.
    ///
    /// The shield goes away before anything else happens. An inactive shield
    /// receives nothing, and an unknown or missing type places nothing.
    pub fn drop(&mut self, transferred: Option<&str>, x: f64, y: f64) -> DropOutcome {
        if !self.shield.is_active() {
            debug!("Drop at ({x:.0}, {y:.0}) ignored, shield inactive");
            self.events.push(BoardEvent::DropIgnored {
                key: transferred.map(str::to_string),
            });
            return DropOutcome::Ignored;
        }
        self.deactivate_shield();

        let key = self.drag.drop_key(transferred).map(str::to_string);
        let icon = key
            .as_deref()
            .and_then(|key| self.registry.resolve(key))
            .map(|(icon, _)| icon.clone());
        let Some(icon) = icon else {
            debug!("Drop ignored, unresolved icon type {key:?}");
            self.events.push(BoardEvent::DropIgnored { key });
            return DropOutcome::Ignored;
        };

        DropOutcome::Placed(self.place_marker(icon, x, y))
    }

    fn place_marker(&mut self, icon: IconType, x: f64, y: f64) -> MarkerId {
        let position = self.map.pixel_to_geo(x, y);
        let mut marker = Marker::new(position, icon.clone());
        let id = marker.id();
        marker.open_editor();
        self.markers.push(marker);

        self.events.push(BoardEvent::MarkerPlaced { id, icon, position });
        self.events.push(BoardEvent::PopupOpened {
            id,
            form: PopupForm::Editor,
        });
        id
    }

    /// Marker clicked: show the view-only popup for its current comment.
    pub fn click_marker(&mut self, id: MarkerId) -> Result<(), BoardError> {
        let marker = self.marker_mut(id).ok_or(BoardError::UnknownMarker(id))?;
        marker.open_viewer();
        self.events.push(BoardEvent::PopupOpened {
            id,
            form: PopupForm::Viewer,
        });
        Ok(())
    }

    /// Save pressed in a marker's editor.
    pub fn save_comment(&mut self, id: MarkerId) -> Result<(), BoardError> {
        let marker = self.marker_mut(id).ok_or(BoardError::UnknownMarker(id))?;
        let comment = marker.save()?.to_string();
        info!("Saved comment for marker {id}: {comment:?}");
        self.events.push(BoardEvent::CommentSaved { id, comment });
        self.events.push(BoardEvent::PopupOpened {
            id,
            form: PopupForm::Viewer,
        });
        Ok(())
    }

    /// Popup dismissed. Nothing is committed.
    pub fn close_popup(&mut self, id: MarkerId) -> Result<(), BoardError> {
        let marker = self.marker_mut(id).ok_or(BoardError::UnknownMarker(id))?;
        if marker.close() {
            self.events.push(BoardEvent::PopupClosed { id });
        }
        Ok(())
    }

    /// Topmost marker whose icon covers pixel `(x, y)`.
    #[must_use]
    pub fn marker_at(&self, x: f64, y: f64) -> Option<MarkerId> {
        self.markers.iter().rev().find_map(|marker| {
            let style = self.registry.style(marker.icon())?;
            let (px, py) = self.map.geo_to_pixel(marker.position());
            let (min_x, min_y, max_x, max_y) = style.rect_at(px, py);
            (x >= min_x && x <= max_x && y >= min_y && y <= max_y).then(|| marker.id())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::BoundingRegion;
    use crate::popup::PopupContent;

    fn new_board() -> Board {
        let bounds = BoundingRegion::new(LatLon::new(52.33, 12.95), LatLon::new(52.45, 13.20));
        let map = MapSurface::new(bounds, LatLon::new(52.3906, 13.0645), 12, 19, 1024.0, 768.0);
        Board::new(IconRegistry::default(), map)
    }

    fn place(board: &mut Board, key: &str, x: f64, y: f64) -> MarkerId {
        board.drag_start(key);
        let outcome = board.drop(Some(key), x, y);
        board.drag_end();
        match outcome {
            DropOutcome::Placed(id) => id,
            DropOutcome::Ignored => panic!("drop of {key} was ignored"),
        }
    }

    #[test]
    fn test_every_icon_places_one_marker_at_drop_point() {
        let mut board = new_board();
        let keys: Vec<String> = board
            .registry()
            .iter()
            .map(|(icon, _)| icon.as_str().to_string())
            .collect();

        for (i, key) in keys.iter().enumerate() {
            let (x, y) = (100.0 + 50.0 * i as f64, 200.0 + 30.0 * i as f64);
            let id = place(&mut board, key, x, y);
            assert_eq!(board.markers().len(), i + 1);

            let marker = board.marker(id).unwrap();
            assert_eq!(marker.icon().as_str(), key);
            let (px, py) = board.map().geo_to_pixel(marker.position());
            assert!((px - x).abs() < 1e-4 && (py - y).abs() < 1e-4, "({px}, {py}) != ({x}, {y})");
            assert_eq!(marker.comment(), "");
        }
    }

    #[test]
    fn test_drop_at_center_lands_on_view_center() {
        let mut board = new_board();
        let view = *board.map().viewport();
        let id = place(&mut board, "dog", view.width / 2.0, view.height / 2.0);

        let position = board.marker(id).unwrap().position();
        assert!((position.lat - view.center.lat).abs() < 1e-9, "{position:?}");
        assert!((position.lon - view.center.lon).abs() < 1e-9, "{position:?}");
    }

    #[test]
    fn test_unknown_or_missing_type_places_nothing() {
        let mut board = new_board();
        board.drag_start("unicorn");
        assert_eq!(board.drop(Some("unicorn"), 10.0, 10.0), DropOutcome::Ignored);
        board.drag_end();

        // No drag ever started with a known type, so there is nothing to fall back to.
        let mut fresh = new_board();
        fresh.drag_start("");
        assert_eq!(fresh.drop(None, 10.0, 10.0), DropOutcome::Ignored);
        fresh.drag_end();

        assert!(board.markers().is_empty());
        assert!(fresh.markers().is_empty());
        assert!(!board.shield().is_active());
        assert!(!fresh.shield().is_active());
    }

    #[test]
    fn test_missing_payload_falls_back_to_last_dragged() {
        let mut board = new_board();
        board.drag_start("mushroom");
        let outcome = board.drop(None, 300.0, 300.0);
        let DropOutcome::Placed(id) = outcome else {
            panic!("expected a marker");
        };
        assert_eq!(board.marker(id).unwrap().icon().as_str(), "mushroom");
    }

    #[test]
    fn test_drop_without_active_shield_is_ignored() {
        let mut board = new_board();
        assert_eq!(board.drop(Some("dog"), 10.0, 10.0), DropOutcome::Ignored);
        assert!(board.markers().is_empty());
    }

    #[test]
    fn test_shield_inactive_before_and_after_every_gesture() {
        let mut board = new_board();
        assert!(!board.shield().is_visible() && !board.shield().is_interactive());

        // Successful drop.
        board.drag_start("dog");
        assert!(board.shield().is_active());
        assert_eq!(board.drag_over(), Some(DropEffect::Copy));
        board.drop(Some("dog"), 50.0, 50.0);
        board.drag_end();
        assert!(!board.shield().is_visible() && !board.shield().is_interactive());
        assert_eq!(board.drag_over(), None);

        // Cancelled drag.
        board.drag_start("guitar");
        board.drag_end();
        assert!(!board.shield().is_visible() && !board.shield().is_interactive());

        // Failed drop.
        board.drag_start("nope");
        board.drop(Some("nope"), 50.0, 50.0);
        board.drag_end();
        assert!(!board.shield().is_visible() && !board.shield().is_interactive());
        assert!(!board.drag_in_progress());
    }

    #[test]
    fn test_shield_goes_away_before_marker_is_placed() {
        let mut board = new_board();
        board.drag_start("disco");
        board.drop(Some("disco"), 400.0, 300.0);
        board.drag_end();

        let events = board.drain_events();
        let deactivated = events
            .iter()
            .position(|e| *e == BoardEvent::ShieldDeactivated)
            .unwrap();
        let placed = events
            .iter()
            .position(|e| matches!(e, BoardEvent::MarkerPlaced { .. }))
            .unwrap();
        assert!(deactivated < placed);
        assert!(matches!(events[0], BoardEvent::DragStarted { .. }));
        assert_eq!(events[1], BoardEvent::ShieldActivated);
        assert_eq!(events.last(), Some(&BoardEvent::DragEnded));

        // Drag end after a drop does not report a second deactivation.
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == BoardEvent::ShieldDeactivated)
                .count(),
            1
        );
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn test_new_marker_opens_editor() {
        let mut board = new_board();
        let id = place(&mut board, "dog", 200.0, 200.0);
        let marker = board.marker(id).unwrap();
        assert!(marker.is_popup_open());
        assert_eq!(marker.render(), PopupContent::Editor { draft: "" });
    }

    #[test]
    fn test_save_is_one_time() {
        let mut board = new_board();
        let id = place(&mut board, "dog", 200.0, 200.0);
        *board.marker_mut(id).unwrap().editor_draft_mut().unwrap() = "  Good boy  ".to_string();
        board.save_comment(id).unwrap();

        let marker = board.marker(id).unwrap();
        assert_eq!(marker.comment(), "Good boy");
        assert!(marker.is_popup_open());
        assert_eq!(marker.render(), PopupContent::Viewer { comment: "Good boy" });

        assert_eq!(board.save_comment(id), Err(BoardError::AlreadySaved(id)));

        // Later interactions only ever show the viewer.
        board.close_popup(id).unwrap();
        board.click_marker(id).unwrap();
        let marker = board.marker_mut(id).unwrap();
        assert_eq!(marker.render(), PopupContent::Viewer { comment: "Good boy" });
        assert!(marker.editor_draft_mut().is_none());
    }

    #[test]
    fn test_empty_comment_renders_placeholder() {
        let mut board = new_board();
        let id = place(&mut board, "bush", 200.0, 200.0);
        *board.marker_mut(id).unwrap().editor_draft_mut().unwrap() = " \n\t ".to_string();
        board.save_comment(id).unwrap();

        let marker = board.marker(id).unwrap();
        assert_eq!(marker.comment(), "");
        assert!(!marker.state().is_editable());
        assert!(marker.render_html().contains("(no comment)"));
    }

    #[test]
    fn test_comment_markup_is_escaped() {
        let mut board = new_board();
        let id = place(&mut board, "skater", 200.0, 200.0);
        *board.marker_mut(id).unwrap().editor_draft_mut().unwrap() =
            "<img src=x onerror=alert(1)>".to_string();
        board.save_comment(id).unwrap();

        let html = board.marker(id).unwrap().render_html();
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_click_before_save_shows_viewer() {
        let mut board = new_board();
        let id = place(&mut board, "tree2", 200.0, 200.0);
        board.marker_mut(id).unwrap().editor_draft_mut().unwrap().push_str("typed");
        board.click_marker(id).unwrap();

        let marker = board.marker(id).unwrap();
        assert_eq!(marker.render(), PopupContent::Viewer { comment: "" });
        assert_eq!(board.save_comment(id), Err(BoardError::EditorNotOpen(id)));
        assert_eq!(board.marker(id).unwrap().comment(), "");
    }

    #[test]
    fn test_dismiss_keeps_state() {
        let mut board = new_board();
        let id = place(&mut board, "dog", 200.0, 200.0);
        board.marker_mut(id).unwrap().editor_draft_mut().unwrap().push_str("half");
        board.drain_events();

        board.close_popup(id).unwrap();
        board.close_popup(id).unwrap();
        assert_eq!(board.drain_events(), vec![BoardEvent::PopupClosed { id }]);

        let marker = board.marker(id).unwrap();
        assert!(!marker.is_popup_open());
        assert!(marker.state().is_editable());
        assert_eq!(marker.comment(), "");
    }

    #[test]
    fn test_markers_are_independent() {
        let mut board = new_board();
        let first = place(&mut board, "dog", 200.0, 200.0);
        let second = place(&mut board, "disco", 500.0, 400.0);
        *board.marker_mut(first).unwrap().editor_draft_mut().unwrap() = "one".to_string();
        board.save_comment(first).unwrap();

        let second = board.marker(second).unwrap();
        assert!(second.state().is_editable());
        assert!(second.is_popup_open());
        assert_eq!(board.marker(first).unwrap().comment(), "one");
    }

    #[test]
    fn test_marker_hit_testing() {
        let mut board = new_board();
        let lower = place(&mut board, "dog", 300.0, 300.0);
        let upper = place(&mut board, "guitar", 310.0, 300.0);

        // Inside both icons: the one placed last wins.
        assert_eq!(board.marker_at(305.0, 300.0), Some(upper));
        // Only inside the dog (its box starts 24px left of the anchor).
        assert_eq!(board.marker_at(280.0, 300.0), Some(lower));
        assert_eq!(board.marker_at(600.0, 600.0), None);

        let missing = place(&mut board, "dog", 700.0, 700.0);
        board.markers.retain(|m| m.id() != missing);
        assert_eq!(board.click_marker(missing), Err(BoardError::UnknownMarker(missing)));
    }
}
