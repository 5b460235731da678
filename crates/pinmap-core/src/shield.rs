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

//! Drag payload tracking and the drop shield overlay.

/// Drag effect declared by sources and accepted by the shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Copy,
}

/// Overlay over the map that only exists while an icon is being dragged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropShield {
    visible: bool,
    interactive: bool,
}

impl DropShield {
    /// A hidden, non-interactive shield.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the shield and let it receive pointer events.
    /// Returns `false` if it was already active.
    pub fn activate(&mut self) -> bool {
        let changed = !self.is_active();
        self.visible = true;
        self.interactive = true;
        changed
    }

    /// Hide the shield and stop it receiving pointer events.
    /// Returns `false` if it was already inactive.
    pub fn deactivate(&mut self) -> bool {
        let changed = self.visible || self.interactive;
        self.visible = false;
        self.interactive = false;
        changed
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.visible && self.interactive
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Accept a hovering drag. Only an active shield accepts.
    #[must_use]
    pub fn drag_over(&self) -> Option<DropEffect> {
        self.is_active().then_some(DropEffect::Copy)
    }
}

/// Payload of the drag in progress, plus the type of the last drag started.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    payload: Option<String>,
    last_dragged: Option<String>,
}

impl DragSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new drag. Returns the effect the source allows.
    pub fn begin(&mut self, icon_key: &str) -> DropEffect {
        self.payload = Some(icon_key.to_string());
        self.last_dragged = Some(icon_key.to_string());
        DropEffect::Copy
    }

    /// Forget the live payload. The last dragged type is kept as a fallback.
    pub fn end(&mut self) {
        self.payload = None;
    }

    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.payload.is_some()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    #[must_use]
    pub fn last_dragged(&self) -> Option<&str> {
        self.last_dragged.as_deref()
    }

    /// Pick the key for a drop: the transferred payload when it is non-empty,
    /// otherwise the last type a drag was started with.
    #[must_use]
    pub fn drop_key<'a>(&'a self, transferred: Option<&'a str>) -> Option<&'a str> {
        transferred
            .filter(|key| !key.is_empty())
            .or(self.last_dragged.as_deref())
    }
}
