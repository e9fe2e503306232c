//! The map widget: tile layer, marker pins, popup and view interaction.

use std::collections::HashMap;

use egui::{
    pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, TextureHandle, Vec2,
};

use crate::config::{ViewerConfig, MAX_ZOOM};
use crate::models::Point;
use crate::services::tile_service::{self, TileFetcher, TileId};
use crate::utils::geo;

const MIN_ZOOM: u8 = 0;

/// Pin geometry, anchored at the tip (the geographic position).
const PIN_HEIGHT: f32 = 22.0;
const PIN_RADIUS: f32 = 7.0;

const PIN_COLOR: Color32 = Color32::from_rgb(0x2a, 0x81, 0xcb);
const PIN_SELECTED_COLOR: Color32 = Color32::from_rgb(0xe8, 0x7a, 0x1e);

/// The UI-side marker: position, popup text and the two plot payloads
/// captured from its originating point.
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub popup: String,
    pub plot1: String,
    pub plot2: String,
}

impl Marker {
    pub fn from_point(point: &Point) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            popup: format!("Timestamp: {}", point.timestamp),
            plot1: point.plot1.clone(),
            plot2: point.plot2.clone(),
        }
    }
}

/// One marker per point, in input order.
pub fn markers_from_points(points: &[Point]) -> Vec<Marker> {
    points.iter().map(Marker::from_point).collect()
}

/// What a frame of map interaction produced.
#[derive(Default)]
pub struct MapResponse {
    pub clicked_marker: Option<usize>,
    pub clicked_elsewhere: bool,
}

/// Map view state. Starts at the configured center and zoom; never fits
/// itself to the marker set.
pub struct MapView {
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    attribution: String,
}

impl MapView {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            center_lat: config.center_lat,
            center_lon: config.center_lon,
            zoom: config.zoom.min(MAX_ZOOM),
            attribution: config.attribution.clone(),
        }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        markers: &[Marker],
        selected: Option<usize>,
        tiles: &mut TileFetcher,
        textures: &HashMap<TileId, TextureHandle>,
    ) -> MapResponse {
        let size = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        if response.dragged() {
            self.pan(response.drag_delta());
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    let step = if scroll > 0.0 { 1 } else { -1 };
                    self.zoom_step(step, pos - rect.center());
                }
            }
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(221));
        self.draw_tiles(&painter, rect, tiles, textures, ui.ctx());

        let positions: Vec<Pos2> = markers
            .iter()
            .map(|m| self.marker_screen_pos(m, rect))
            .collect();
        for (i, pos) in positions.iter().enumerate() {
            draw_pin(&painter, *pos, selected == Some(i));
        }

        if let Some(i) = selected {
            if let Some(marker) = markers.get(i) {
                draw_popup(ui, positions[i], &marker.popup);
            }
        }

        painter.text(
            rect.right_bottom() - vec2(6.0, 4.0),
            Align2::RIGHT_BOTTOM,
            &self.attribution,
            FontId::proportional(11.0),
            Color32::from_gray(80),
        );

        self.zoom_controls(ui, rect);

        let mut out = MapResponse::default();
        if response.clicked() {
            if let Some(click) = response.interact_pointer_pos() {
                match hit_marker(&positions, click) {
                    Some(i) => out.clicked_marker = Some(i),
                    None => out.clicked_elsewhere = true,
                }
            }
        }
        out
    }

    fn pan(&mut self, delta: Vec2) {
        let (cx, cy) = geo::project(self.center_lat, self.center_lon, self.zoom);
        let (lat, lon) =
            geo::unproject(cx - f64::from(delta.x), cy - f64::from(delta.y), self.zoom);
        self.center_lat = lat;
        self.center_lon = lon;
    }

    fn zoom_step(&mut self, direction: i8, cursor_offset: Vec2) {
        let new_zoom = if direction > 0 {
            (self.zoom + 1).min(MAX_ZOOM)
        } else {
            self.zoom.saturating_sub(1).max(MIN_ZOOM)
        };
        if new_zoom == self.zoom {
            return;
        }

        let (cx, cy) = geo::project(self.center_lat, self.center_lon, self.zoom);
        let factor = geo::world_size(new_zoom) / geo::world_size(self.zoom);
        let (ncx, ncy) = zoom_anchored(
            (cx, cy),
            (f64::from(cursor_offset.x), f64::from(cursor_offset.y)),
            factor,
        );
        let (lat, lon) = geo::unproject(ncx, ncy, new_zoom);
        self.zoom = new_zoom;
        self.center_lat = lat;
        self.center_lon = lon;
    }

    fn draw_tiles(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        tiles: &mut TileFetcher,
        textures: &HashMap<TileId, TextureHandle>,
        ctx: &egui::Context,
    ) {
        let tile = f64::from(geo::TILE_SIZE);
        let (cx, cy) = geo::project(self.center_lat, self.center_lon, self.zoom);
        let top_left_x = cx - f64::from(rect.width()) / 2.0;
        let top_left_y = cy - f64::from(rect.height()) / 2.0;

        let (x0, x1) = tile_service::tile_range(top_left_x, f64::from(rect.width()));
        let (y0, y1) = tile_service::tile_range(top_left_y, f64::from(rect.height()));

        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let Some(id) = tile_service::wrap_tile(tx, ty, self.zoom) else {
                    continue;
                };
                let min = rect.min
                    + vec2(
                        (tx as f64 * tile - top_left_x) as f32,
                        (ty as f64 * tile - top_left_y) as f32,
                    );
                let tile_rect = Rect::from_min_size(min, Vec2::splat(geo::TILE_SIZE as f32));

                match textures.get(&id) {
                    Some(texture) => {
                        painter.image(
                            texture.id(),
                            tile_rect,
                            Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0)),
                            Color32::WHITE,
                        );
                    }
                    None => tiles.request(id, ctx),
                }
            }
        }
    }

    /// Screen position for a marker, picking the world copy nearest to the
    /// view center so markers stay visible across the date line.
    fn marker_screen_pos(&self, marker: &Marker, rect: Rect) -> Pos2 {
        let world = geo::world_size(self.zoom);
        let (cx, cy) = geo::project(self.center_lat, self.center_lon, self.zoom);
        let (mx, my) = geo::project(marker.lat, marker.lon, self.zoom);

        let mut dx = mx - cx;
        dx -= (dx / world).round() * world;
        rect.center() + vec2(dx as f32, (my - cy) as f32)
    }

    fn zoom_controls(&mut self, ui: &mut egui::Ui, rect: Rect) {
        let plus = Rect::from_min_size(rect.min + vec2(8.0, 8.0), vec2(26.0, 26.0));
        if ui.put(plus, egui::Button::new("+")).clicked() {
            self.zoom_step(1, Vec2::ZERO);
        }
        let minus = plus.translate(vec2(0.0, 30.0));
        if ui.put(minus, egui::Button::new("−")).clicked() {
            self.zoom_step(-1, Vec2::ZERO);
        }
    }
}

/// New view center after zooming by `factor` while keeping the world point
/// under `cursor_offset` (relative to the view center) fixed on screen.
fn zoom_anchored(center: (f64, f64), cursor_offset: (f64, f64), factor: f64) -> (f64, f64) {
    (
        (center.0 + cursor_offset.0) * factor - cursor_offset.0,
        (center.1 + cursor_offset.1) * factor - cursor_offset.1,
    )
}

fn draw_pin(painter: &egui::Painter, tip: Pos2, selected: bool) {
    let color = if selected {
        PIN_SELECTED_COLOR
    } else {
        PIN_COLOR
    };
    let head = pos2(tip.x, tip.y - PIN_HEIGHT + PIN_RADIUS);

    painter.add(egui::Shape::convex_polygon(
        vec![
            pos2(tip.x - 5.0, head.y + 3.0),
            pos2(tip.x + 5.0, head.y + 3.0),
            tip,
        ],
        color,
        Stroke::NONE,
    ));
    painter.circle(head, PIN_RADIUS, color, Stroke::new(1.5, Color32::WHITE));
}

fn draw_popup(ui: &egui::Ui, pin: Pos2, text: &str) {
    let pos = pos2(pin.x, pin.y - PIN_HEIGHT - 8.0);
    egui::Area::new(egui::Id::new("marker-popup"))
        .pivot(Align2::CENTER_BOTTOM)
        .fixed_pos(pos)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(text);
            });
        });
}

/// Topmost marker whose pin contains the click, if any. Later markers draw
/// on top, so the scan runs back to front.
fn hit_marker(positions: &[Pos2], click: Pos2) -> Option<usize> {
    positions
        .iter()
        .enumerate()
        .rev()
        .find(|(_, tip)| {
            let head = pos2(tip.x, tip.y - PIN_HEIGHT + PIN_RADIUS);
            click.distance(head) <= PIN_RADIUS + 3.0
                || Rect::from_min_max(pos2(tip.x - 4.0, head.y), pos2(tip.x + 4.0, tip.y))
                    .contains(click)
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64, timestamp: &str) -> Point {
        Point {
            lat,
            lon,
            timestamp: timestamp.to_string(),
            plot1: r#"{"data":[]}"#.to_string(),
            plot2: r#"{"data":[]}"#.to_string(),
        }
    }

    #[test]
    fn test_one_marker_per_point_in_order() {
        let points = vec![point(10.0, 20.0, "t1"), point(-5.0, 30.0, "t2")];
        let markers = markers_from_points(&points);

        assert_eq!(markers.len(), points.len());
        assert_eq!((markers[0].lat, markers[0].lon), (10.0, 20.0));
        assert_eq!((markers[1].lat, markers[1].lon), (-5.0, 30.0));
    }

    #[test]
    fn test_popup_text_is_literal() {
        let markers = markers_from_points(&[point(0.0, 0.0, "2024-01-01 00:00:00")]);
        assert_eq!(markers[0].popup, "Timestamp: 2024-01-01 00:00:00");
    }

    #[test]
    fn test_marker_keeps_its_own_payloads() {
        let mut a = point(0.0, 0.0, "a");
        a.plot1 = r#"{"data":[{"y":[1]}]}"#.to_string();
        let b = point(1.0, 1.0, "b");

        let markers = markers_from_points(&[a, b]);
        assert_eq!(markers[0].plot1, r#"{"data":[{"y":[1]}]}"#);
        assert_eq!(markers[1].plot1, r#"{"data":[]}"#);
    }

    #[test]
    fn test_empty_points_yield_no_markers() {
        assert!(markers_from_points(&[]).is_empty());
    }

    #[test]
    fn test_hit_marker() {
        let positions = vec![pos2(100.0, 100.0), pos2(300.0, 100.0)];

        // On the pin head.
        let head_y = 100.0 - PIN_HEIGHT + PIN_RADIUS;
        assert_eq!(hit_marker(&positions, pos2(100.0, head_y)), Some(0));
        assert_eq!(hit_marker(&positions, pos2(300.0, head_y)), Some(1));
        // On the tip.
        assert_eq!(hit_marker(&positions, pos2(100.0, 99.0)), Some(0));
        // Far away.
        assert_eq!(hit_marker(&positions, pos2(200.0, 200.0)), None);
    }

    #[test]
    fn test_hit_marker_prefers_topmost() {
        // Two pins drawn at the same spot: the later one is on top.
        let positions = vec![pos2(50.0, 50.0), pos2(50.0, 50.0)];
        let head_y = 50.0 - PIN_HEIGHT + PIN_RADIUS;
        assert_eq!(hit_marker(&positions, pos2(50.0, head_y)), Some(1));
    }

    #[test]
    fn test_zoom_anchored_keeps_cursor_point() {
        let center = (512.0, 512.0);
        let cursor = (100.0, -40.0);
        let factor = 2.0;

        let world_before = (center.0 + cursor.0, center.1 + cursor.1);
        let new_center = zoom_anchored(center, cursor, factor);
        // The world point under the cursor, scaled, must sit at the same
        // screen offset from the new center.
        assert_eq!(world_before.0 * factor - new_center.0, cursor.0);
        assert_eq!(world_before.1 * factor - new_center.1, cursor.1);
    }

    #[test]
    fn test_initial_view_is_fixed_default() {
        let view = MapView::new(&ViewerConfig::default());
        assert_eq!(view.center_lat, 0.0);
        assert_eq!(view.center_lon, 0.0);
        assert_eq!(view.zoom, 2);
    }
}
