//! The application: wires the loader, the map view and the two graph
//! slots together.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver};

use egui::TextureHandle;
use tracing::{error, info};

use crate::config::ViewerConfig;
use crate::models::{chart, Point};
use crate::services::chart_service;
use crate::services::loader::{self, LoaderError};
use crate::services::tile_service::{TileFetcher, TileId};
use crate::ui::graph_panel::GraphPanel;
use crate::ui::map_view::{markers_from_points, MapView, Marker};

pub struct ViewerApp {
    markers: Vec<Marker>,
    selected: Option<usize>,
    map: MapView,
    graphs: [GraphPanel; 2],
    tiles: TileFetcher,
    tile_textures: HashMap<TileId, TextureHandle>,
    points_rx: Receiver<Result<Vec<Point>, LoaderError>>,
    loaded: bool,
    status: String,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ViewerConfig,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        // The one retrieval of the points document.
        let (tx, rx) = channel();
        let source = config.points_source.clone();
        let egui_ctx = cc.egui_ctx.clone();
        runtime.spawn(async move {
            let _ = tx.send(loader::load_points(&source).await);
            egui_ctx.request_repaint();
        });

        let status = format!("Loading {}...", config.points_source);
        Self {
            markers: Vec::new(),
            selected: None,
            map: MapView::new(&config),
            graphs: [GraphPanel::new("graph1"), GraphPanel::new("graph2")],
            tiles: TileFetcher::new(config.tile_url.clone(), runtime),
            tile_textures: HashMap::new(),
            points_rx: rx,
            loaded: false,
            status,
        }
    }

    fn poll_events(&mut self, ctx: &egui::Context) {
        if !self.loaded {
            if let Ok(result) = self.points_rx.try_recv() {
                self.loaded = true;
                match result {
                    Ok(points) => {
                        self.markers = markers_from_points(&points);
                        self.status = format!("{} points", points.len());
                    }
                    Err(e) => {
                        // The map stays empty; the app keeps running.
                        error!("failed to load points: {}", e);
                        self.status = format!("Failed to load points: {}", e);
                    }
                }
            }
        }

        for tile in self.tiles.poll() {
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [tile.width as usize, tile.height as usize],
                &tile.rgba,
            );
            let name = format!("tile-{}-{}-{}", tile.id.z, tile.id.x, tile.id.y);
            let texture = ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
            self.tile_textures.insert(tile.id, texture);
        }
    }

    /// Marker click: open the popup and render the point's two payloads
    /// into `graph1` and `graph2`.
    fn open_marker(&mut self, ctx: &egui::Context, index: usize) {
        self.selected = Some(index);
        info!("marker {} clicked", index);

        let payloads = [
            self.markers[index].plot1.clone(),
            self.markers[index].plot2.clone(),
        ];
        for (panel, payload) in self.graphs.iter_mut().zip(payloads) {
            match chart::parse_definition(&payload) {
                Ok(def) => match chart_service::render_definition(
                    &def,
                    chart_service::CHART_WIDTH,
                    chart_service::CHART_HEIGHT,
                ) {
                    Ok(rendered) => panel.set_chart(ctx, rendered),
                    Err(e) => {
                        error!("failed to render {}: {}", panel.name(), e);
                        panel.set_error(e.to_string());
                    }
                },
                Err(e) => {
                    error!("malformed plot payload for {}: {}", panel.name(), e);
                    panel.set_error(format!("malformed plot payload: {}", e));
                }
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events(ctx);

        egui::SidePanel::right("graphs")
            .default_width(460.0)
            .show(ctx, |ui| {
                for panel in &self.graphs {
                    panel.show(ui);
                    ui.separator();
                }
            });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let response = self.map.show(
                    ui,
                    &self.markers,
                    self.selected,
                    &mut self.tiles,
                    &self.tile_textures,
                );
                if let Some(index) = response.clicked_marker {
                    self.open_marker(ctx, index);
                } else if response.clicked_elsewhere {
                    self.selected = None;
                }
            });
    }
}
