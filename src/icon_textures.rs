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

//! Marker icon textures.
//!
//! Icons are decoded from the asset directory the first time they are drawn.
//! A missing or broken image is reported once and drawn as a labelled
//! placeholder of the style's size instead.

use egui::{Color32, ColorImage, Painter, Rect, TextureHandle};
use pinmap_core::{IconStyle, IconType};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct IconTextures {
    asset_dir: PathBuf,
    textures: HashMap<IconType, Option<TextureHandle>>,
}

impl std::fmt::Debug for IconTextures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconTextures")
            .field("asset_dir", &self.asset_dir)
            .field("loaded", &self.textures.len())
            .finish()
    }
}

impl IconTextures {
    pub fn new(asset_dir: PathBuf) -> Self {
        Self {
            asset_dir,
            textures: HashMap::new(),
        }
    }

    fn texture(&mut self, ctx: &egui::Context, icon: &IconType, style: &IconStyle) -> Option<TextureHandle> {
        self.textures
            .entry(icon.clone())
            .or_insert_with(|| {
                let path = self.asset_dir.join(&style.image);
                match image::open(&path) {
                    Ok(img) => {
                        let rgba = img.to_rgba8();
                        let size = [rgba.width() as usize, rgba.height() as usize];
                        let color_image = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                        log::debug!("Loaded icon '{icon}' from {}", path.display());
                        Some(ctx.load_texture(
                            format!("icon_{icon}"),
                            color_image,
                            egui::TextureOptions::LINEAR,
                        ))
                    }
                    Err(e) => {
                        log::warn!("Icon '{icon}' unavailable ({}): {e}", path.display());
                        None
                    }
                }
            })
            .clone()
    }

    /// Draw an icon into `rect`, or a placeholder when its image is unavailable.
    pub fn paint(&mut self, painter: &Painter, rect: Rect, icon: &IconType, style: &IconStyle) {
        if let Some(texture) = self.texture(painter.ctx(), icon, style) {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
            return;
        }

        painter.rect_filled(rect, 6.0, placeholder_color(icon));
        let label: String = icon.as_str().chars().take(2).collect();
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(14.0),
            Color32::WHITE,
        );
    }
}

/// Stable, readable color per icon type.
fn placeholder_color(icon: &IconType) -> Color32 {
    let hash = icon
        .as_str()
        .bytes()
        .fold(0_u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    let [r, g, b, _] = hash.to_le_bytes();
    Color32::from_rgba_unmultiplied(60 + r % 140, 60 + g % 140, 60 + b % 140, 230)
}
