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

//! Main window: icon palette, map with markers, drop shield and comment popups.

use eframe::egui;
use egui::{Align2, Color32, Rect, RichText};
use pinmap_core::popup::{EDITOR_ROWS, NO_COMMENT_PLACEHOLDER, POPUP_TITLE, SAVE_LABEL};
use pinmap_core::{
    visible_comment, Board, BoardEvent, DropOutcome, IconRegistry, Marker, MarkerId, PopupContent, TILE_SIZE,
};

use crate::config::AppConfig;
use crate::icon_textures::IconTextures;
use crate::tiles::{self, TileManager, TileSource};

const PALETTE_ICON_HEIGHT: f32 = 48.0;
const POPUP_WIDTH: f32 = 220.0;
/// Scroll distance, in points, that counts as one zoom step.
const ZOOM_SCROLL_STEP: f32 = 60.0;

/// Drag payload carried from a palette icon to the map: the icon type key.
#[derive(Debug, Clone)]
struct PaletteDrag(String);

#[derive(Debug, Clone, Copy)]
enum PopupAction {
    Save(MarkerId),
    Close(MarkerId),
}

#[derive(Debug)]
pub struct PinmapApp {
    board: Board,
    tiles: TileManager,
    icons: IconTextures,
    attribution: String,
    attribution_url: String,
    palette_width: f32,
    scroll_accumulator: f32,
}

impl PinmapApp {
    pub fn new(config: &AppConfig) -> Self {
        let source = TileSource::new(config.tile_url.clone(), config.tile_subdomains.clone());
        Self {
            board: Board::new(IconRegistry::default(), config.map_surface()),
            tiles: TileManager::new(source),
            icons: IconTextures::new(config.asset_dir.clone()),
            attribution: config.attribution.clone(),
            attribution_url: config.attribution_url.clone(),
            palette_width: config.palette_width,
            scroll_accumulator: 0.0,
        }
    }

    /// Translate egui's drag-and-drop payload into drag start and drag end.
    ///
    /// Drag end fires whenever the payload is gone, whether it was dropped on
    /// the map, released elsewhere or cancelled.
    fn sync_drag_session(&mut self, ctx: &egui::Context) {
        let carried = egui::DragAndDrop::payload::<PaletteDrag>(ctx);
        match carried {
            Some(payload) if !self.board.drag_in_progress() => {
                self.board.drag_start(&payload.0);
            }
            None if self.board.drag_in_progress() => self.board.drag_end(),
            _ => {}
        }
    }

    fn draw_palette(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.label(RichText::new("Drag onto the map").strong());
        ui.add_space(6.0);

        let registry = self.board.registry();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (icon, style) in registry.iter() {
                let id = egui::Id::new(("palette", icon.as_str()));
                ui.vertical_centered(|ui| {
                    ui.dnd_drag_source(id, PaletteDrag(icon.as_str().to_string()), |ui| {
                        let scale = (PALETTE_ICON_HEIGHT / style.size[1]).min(1.0);
                        let size = egui::vec2(style.size[0], style.size[1]) * scale;
                        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                        self.icons.paint(ui.painter(), rect, icon, style);
                        ui.label(RichText::new(icon.as_str()).small());
                    });
                });
                ui.add_space(8.0);
            }
        });
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        let map = self.board.map();
        let saved = self
            .board
            .markers()
            .iter()
            .filter(|m| !m.state().is_editable())
            .count();

        ui.horizontal(|ui| {
            ui.label(format!("Markers: {}", self.board.markers().len()));
            ui.separator();
            ui.label(format!("Commented: {saved}"));
            ui.separator();
            ui.label(format!("Zoom: {} (min {})", map.zoom(), map.min_zoom()));

            let failed = self.tiles.get_error_count();
            if failed > 0 {
                ui.separator();
                ui.colored_label(Color32::from_rgb(220, 80, 60), format!("Failed to load {failed} tiles"));
            } else if self.tiles.has_loading_tiles() {
                ui.separator();
                ui.label("Loading map tiles...");
            }
        });
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;

        self.board
            .map_mut()
            .resize(f64::from(rect.width()), f64::from(rect.height()));

        painter.rect_filled(rect, 0.0, Color32::from_rgb(221, 221, 214));

        // Pan with the primary button, always snapping back inside the region
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            self.board
                .map_mut()
                .pan_by(f64::from(delta.x), f64::from(delta.y));
        }

        if response.hovered() {
            self.scroll_accumulator += ui.input(|i| i.smooth_scroll_delta.y);
            if self.scroll_accumulator.abs() >= ZOOM_SCROLL_STEP {
                let steps = if self.scroll_accumulator > 0.0 { 1 } else { -1 };
                self.board.map_mut().zoom_by(steps);
                self.scroll_accumulator = 0.0;
            }
        }

        self.paint_tiles(ui.ctx(), &painter, rect);
        self.paint_markers(&painter, rect);

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                if let Some(id) = self.board.marker_at(f64::from(local.x), f64::from(local.y)) {
                    if let Err(e) = self.board.click_marker(id) {
                        log::debug!("Marker click ignored: {e}");
                    }
                }
            }
        }

        self.handle_shield(ui, &response, &painter);

        if !self.board.drag_in_progress() && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            let open: Vec<MarkerId> = self.open_popups();
            for id in open {
                self.apply(PopupAction::Close(id));
            }
        }

        let actions: Vec<PopupAction> = self
            .open_popups()
            .into_iter()
            .filter_map(|id| self.draw_popup(ui.ctx(), rect, id))
            .collect();
        for action in actions {
            self.apply(action);
        }

        self.draw_map_controls(ui.ctx(), rect);
    }

    fn paint_tiles(&self, ctx: &egui::Context, painter: &egui::Painter, rect: Rect) {
        let viewport = *self.board.map().viewport();
        let tile_size = egui::vec2(TILE_SIZE as f32, TILE_SIZE as f32);

        for (coord, offset_x, offset_y) in tiles::get_visible_tiles(&viewport) {
            if let Some(texture) = self.tiles.get_tile(coord, ctx) {
                let tile_rect = Rect::from_min_size(rect.min + egui::vec2(offset_x, offset_y), tile_size);
                painter.image(
                    texture.id(),
                    tile_rect,
                    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
        }
    }

    fn paint_markers(&mut self, painter: &egui::Painter, rect: Rect) {
        let map = self.board.map();
        let registry = self.board.registry();

        for marker in self.board.markers() {
            let Some(style) = registry.style(marker.icon()) else {
                continue;
            };
            let (x, y) = map.geo_to_pixel(marker.position());
            let (min_x, min_y, max_x, max_y) = style.rect_at(x, y);
            let icon_rect = Rect::from_min_max(
                rect.min + egui::vec2(min_x as f32, min_y as f32),
                rect.min + egui::vec2(max_x as f32, max_y as f32),
            );
            if icon_rect.intersects(rect) {
                self.icons.paint(painter, icon_rect, marker.icon(), style);
            }
        }
    }

    /// Drop shield: visible and accepting drops only while a palette drag is live.
    fn handle_shield(&mut self, ui: &egui::Ui, response: &egui::Response, painter: &egui::Painter) {
        if !self.board.shield().is_active() {
            return;
        }
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(40, 110, 200, 36));

        if response.dnd_hover_payload::<PaletteDrag>().is_some() && self.board.drag_over().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Copy);
        }

        let Some(payload) = response.dnd_release_payload::<PaletteDrag>() else {
            return;
        };
        let pos = response
            .hover_pos()
            .or_else(|| ui.ctx().pointer_latest_pos())
            .unwrap_or_else(|| rect.center());
        let local = pos - rect.min;
        let outcome = self
            .board
            .drop(Some(payload.0.as_str()), f64::from(local.x), f64::from(local.y));
        if let DropOutcome::Placed(id) = outcome {
            log::debug!("Drop of '{}' placed marker {id}", payload.0);
        }
    }

    fn open_popups(&self) -> Vec<MarkerId> {
        self.board
            .markers()
            .iter()
            .filter(|m| m.is_popup_open())
            .map(Marker::id)
            .collect()
    }

    /// Draw one marker's popup above its icon. Returns what the user asked for.
    fn draw_popup(&mut self, ctx: &egui::Context, map_rect: Rect, id: MarkerId) -> Option<PopupAction> {
        let anchor = {
            let marker = self.board.marker(id)?;
            let style = self.board.registry().style(marker.icon())?;
            let (x, y) = self.board.map().geo_to_pixel(marker.position());
            let (_, top, _, _) = style.rect_at(x, y);
            map_rect.min + egui::vec2(x as f32, top as f32 - 4.0)
        };
        // Off-screen popups stay open but are not drawn.
        if !map_rect.contains(anchor) {
            return None;
        }

        let marker = self.board.marker_mut(id)?;
        let mut action = None;

        egui::Area::new(egui::Id::new(("marker_popup", id)))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor)
            .pivot(Align2::CENTER_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(POPUP_WIDTH);
                    ui.horizontal(|ui| {
                        ui.strong(POPUP_TITLE);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("×").clicked() {
                                action = Some(PopupAction::Close(id));
                            }
                        });
                    });

                    match marker.render() {
                        PopupContent::Editor { .. } => {
                            if let Some(draft) = marker.editor_draft_mut() {
                                ui.add(
                                    egui::TextEdit::multiline(draft)
                                        .desired_rows(EDITOR_ROWS)
                                        .desired_width(f32::INFINITY),
                                );
                            }
                            let save = ui.add_sized([ui.available_width(), 24.0], egui::Button::new(SAVE_LABEL));
                            if save.clicked() {
                                action = Some(PopupAction::Save(id));
                            }
                        }
                        PopupContent::Viewer { comment } => match visible_comment(comment) {
                            Some(comment) => {
                                ui.label(comment);
                            }
                            None => {
                                ui.label(RichText::new(NO_COMMENT_PLACEHOLDER).italics());
                            }
                        },
                    }
                });
            });

        action
    }

    fn apply(&mut self, action: PopupAction) {
        let result = match action {
            PopupAction::Save(id) => self.board.save_comment(id),
            PopupAction::Close(id) => self.board.close_popup(id),
        };
        if let Err(e) = result {
            log::debug!("Popup action {action:?} ignored: {e}");
        }
    }

    fn draw_map_controls(&mut self, ctx: &egui::Context, map_rect: Rect) {
        egui::Area::new(egui::Id::new("zoom_controls"))
            .order(egui::Order::Middle)
            .fixed_pos(map_rect.left_top() + egui::vec2(10.0, 10.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let map = self.board.map();
                    let can_zoom_in = map.zoom() < map.max_zoom();
                    let can_zoom_out = map.zoom() > map.min_zoom();
                    if ui.add_enabled(can_zoom_in, egui::Button::new("+")).clicked() {
                        self.board.map_mut().zoom_by(1);
                    }
                    if ui.add_enabled(can_zoom_out, egui::Button::new("−")).clicked() {
                        self.board.map_mut().zoom_by(-1);
                    }
                });
            });

        egui::Area::new(egui::Id::new("attribution"))
            .order(egui::Order::Middle)
            .fixed_pos(map_rect.right_bottom())
            .pivot(Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(Color32::from_rgba_unmultiplied(255, 255, 255, 200))
                    .inner_margin(egui::Margin::symmetric(4, 2))
                    .show(ui, |ui| {
                        ui.hyperlink_to(
                            RichText::new(&self.attribution).small().color(Color32::DARK_GRAY),
                            &self.attribution_url,
                        );
                    });
            });
    }

    fn log_board_events(&mut self) {
        for event in self.board.drain_events() {
            match event {
                BoardEvent::MarkerPlaced { id, icon, position } => {
                    log::info!("Placed '{icon}' marker {id} at {:.5}, {:.5}", position.lat, position.lon);
                }
                BoardEvent::DropIgnored { key } => {
                    log::info!("Drop ignored, no known icon type ({key:?})");
                }
                BoardEvent::CommentSaved { id, comment } => {
                    log::debug!("Comment on marker {id} is now read-only: {comment:?}");
                }
                other => log::debug!("{other:?}"),
            }
        }
    }
}

impl eframe::App for PinmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("icon_palette")
            .resizable(false)
            .exact_width(self.palette_width)
            .show(ctx, |ui| self.draw_palette(ui));

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.draw_status(ui));

        self.sync_drag_session(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_map(ui));

        self.log_board_events();
    }
}
