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

//! Icon registry: symbolic icon keys and the marker styles they map to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic key of a marker style, e.g. `"dog"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconType(String);

impl IconType {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IconType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a marker of a given type is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    /// Image file name, relative to the asset directory.
    pub image: String,
    /// Display size `[width, height]` in pixels.
    pub size: [f32; 2],
    /// Point inside the image, from its top-left corner, placed on the coordinate.
    pub anchor: [f32; 2],
}

impl IconStyle {
    pub fn new(image: impl Into<String>, size: [f32; 2], anchor: [f32; 2]) -> Self {
        Self {
            image: image.into(),
            size,
            anchor,
        }
    }

    /// Icon rectangle `(min_x, min_y, max_x, max_y)` for a marker at pixel `(x, y)`.
    #[must_use]
    pub fn rect_at(&self, x: f64, y: f64) -> (f64, f64, f64, f64) {
        let min_x = x - f64::from(self.anchor[0]);
        let min_y = y - f64::from(self.anchor[1]);
        (
            min_x,
            min_y,
            min_x + f64::from(self.size[0]),
            min_y + f64::from(self.size[1]),
        )
    }
}

const DEFAULT_ANCHOR: [f32; 2] = [24.0, 24.0];

const DEFAULT_ICONS: &[(&str, &str, [f32; 2])] = &[
    ("dog", "dog.png", [48.0, 48.0]),
    ("disco", "disco_ball.png", [48.0, 48.0]),
    ("mushroom", "mushrooms.png", [48.0, 48.0]),
    ("ballerina", "ballerina.png", [80.0, 48.0]),
    ("guitar", "guitar.png", [80.0, 48.0]),
    ("skater", "skater.png", [48.0, 48.0]),
    ("bush", "bush.png", [80.0, 48.0]),
    ("tree1", "tree1.png", [48.0, 80.0]),
    ("tree2", "tree2.png", [48.0, 48.0]),
];

/// Read-only mapping from [`IconType`] to [`IconStyle`], in palette order.
#[derive(Debug, Clone)]
pub struct IconRegistry {
    entries: Vec<(IconType, IconStyle)>,
}

impl IconRegistry {
    /// Build a registry. Later duplicates of a key are ignored.
    pub fn new(entries: impl IntoIterator<Item = (IconType, IconStyle)>) -> Self {
        let mut unique: Vec<(IconType, IconStyle)> = Vec::new();
        for (icon, style) in entries {
            if unique.iter().any(|(existing, _)| *existing == icon) {
                log::warn!("Ignoring duplicate icon type '{icon}'");
                continue;
            }
            unique.push((icon, style));
        }
        Self { entries: unique }
    }

    /// Look up a key. Unknown or empty keys yield `None`.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<(&IconType, &IconStyle)> {
        self.entries
            .iter()
            .find(|(icon, _)| icon.as_str() == key)
            .map(|(icon, style)| (icon, style))
    }

    #[must_use]
    pub fn style(&self, icon: &IconType) -> Option<&IconStyle> {
        self.resolve(icon.as_str()).map(|(_, style)| style)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IconType, &IconStyle)> {
        self.entries.iter().map(|(icon, style)| (icon, style))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IconRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ICONS.iter().map(|&(key, image, size)| {
            (IconType::new(key), IconStyle::new(image, size, DEFAULT_ANCHOR))
        }))
    }
}
