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

//! Placed markers and their comment popups.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BoardError;
use crate::geo::LatLon;
use crate::icons::IconType;
use crate::popup::{PopupContent, PopupForm, PopupState};

/// Stable identifier of a placed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(Uuid);

impl MarkerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A marker dropped on the map.
#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    position: LatLon,
    icon: IconType,
    state: PopupState,
    form: PopupForm,
    open: bool,
}

impl Marker {
    /// New marker with an empty comment and its editor ready, popup closed.
    #[must_use]
    pub fn new(position: LatLon, icon: IconType) -> Self {
        Self {
            id: MarkerId::new(),
            position,
            icon,
            state: PopupState::default(),
            form: PopupForm::Editor,
            open: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> MarkerId {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> LatLon {
        self.position
    }

    #[must_use]
    pub fn icon(&self) -> &IconType {
        &self.icon
    }

    #[must_use]
    pub fn state(&self) -> &PopupState {
        &self.state
    }

    /// Committed comment, empty until the first save.
    #[must_use]
    pub fn comment(&self) -> &str {
        self.state.comment()
    }

    #[must_use]
    pub fn is_popup_open(&self) -> bool {
        self.open
    }

    fn editor_showing(&self) -> bool {
        self.open && self.form == PopupForm::Editor && self.state.is_editable()
    }

    /// What the popup shows right now.
    #[must_use]
    pub fn render(&self) -> PopupContent<'_> {
        match &self.state {
            PopupState::Editable(draft) if self.form == PopupForm::Editor => {
                PopupContent::Editor { draft }
            }
            _ => PopupContent::Viewer {
                comment: self.comment(),
            },
        }
    }

    #[must_use]
    pub fn render_html(&self) -> String {
        self.render().to_html()
    }

    /// Text area contents, available only while the editor is on screen.
    pub fn editor_draft_mut(&mut self) -> Option<&mut String> {
        if !self.editor_showing() {
            return None;
        }
        match &mut self.state {
            PopupState::Editable(draft) => Some(draft),
            PopupState::ViewOnly(_) => None,
        }
    }

    pub(crate) fn open_editor(&mut self) {
        self.open = true;
    }

    /// Show the view-only form for the committed comment.
    pub(crate) fn open_viewer(&mut self) {
        self.form = PopupForm::Viewer;
        self.open = true;
    }

    pub(crate) fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Commit the draft and switch to the view-only form for good.
    pub(crate) fn save(&mut self) -> Result<&str, BoardError> {
        if !self.state.is_editable() {
            return Err(BoardError::AlreadySaved(self.id));
        }
        if !self.editor_showing() {
            return Err(BoardError::EditorNotOpen(self.id));
        }
        let state = std::mem::take(&mut self.state);
        self.state = state.save();
        self.open_viewer();
        Ok(self.state.comment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> Marker {
        Marker::new(LatLon::new(52.4, 13.06), IconType::new("dog"))
    }

    #[test]
    fn test_new_marker() {
        let marker = marker();
        assert_eq!(marker.comment(), "");
        assert!(marker.state().is_editable());
        assert!(!marker.is_popup_open());
        assert_eq!(marker.render(), PopupContent::Editor { draft: "" });
    }

    #[test]
    fn test_draft_only_while_editor_open() {
        let mut marker = marker();
        assert!(marker.editor_draft_mut().is_none());
        marker.open_editor();
        marker.editor_draft_mut().unwrap().push_str("hi");
        assert_eq!(marker.render(), PopupContent::Editor { draft: "hi" });
    }

    #[test]
    fn test_save_requires_open_editor() {
        let mut marker = marker();
        let id = marker.id();
        assert_eq!(marker.save(), Err(BoardError::EditorNotOpen(id)));

        marker.open_editor();
        *marker.editor_draft_mut().unwrap() = "  nice spot ".to_string();
        assert_eq!(marker.save(), Ok("nice spot"));
        assert_eq!(marker.render(), PopupContent::Viewer { comment: "nice spot" });
        assert!(marker.is_popup_open());

        assert_eq!(marker.save(), Err(BoardError::AlreadySaved(id)));
        assert!(marker.editor_draft_mut().is_none());
    }

    #[test]
    fn test_viewer_before_save_hides_editor() {
        let mut marker = marker();
        marker.open_editor();
        marker.close();
        marker.open_viewer();
        assert_eq!(marker.render(), PopupContent::Viewer { comment: "" });
        assert!(marker.editor_draft_mut().is_none());
        assert!(marker.state().is_editable());
    }

    #[test]
    fn test_viewer_content_selects_placeholder() {
        let mut unsaved = marker();
        unsaved.open_viewer();
        let PopupContent::Viewer { comment } = unsaved.render() else {
            panic!("expected the viewer");
        };
        assert_eq!(crate::popup::visible_comment(comment), None);

        let mut saved = marker();
        saved.open_editor();
        *saved.editor_draft_mut().unwrap() = "by the lake".to_string();
        saved.save().unwrap();
        let PopupContent::Viewer { comment } = saved.render() else {
            panic!("expected the viewer");
        };
        assert_eq!(crate::popup::visible_comment(comment), Some("by the lake"));
    }
}
