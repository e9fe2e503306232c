//! A named chart slot (`graph1`, `graph2`). Every render fully replaces
//! the previous content.

use egui::TextureHandle;

use crate::services::chart_service::RenderedChart;

pub struct GraphPanel {
    name: &'static str,
    texture: Option<TextureHandle>,
    error: Option<String>,
}

impl GraphPanel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            texture: None,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn set_chart(&mut self, ctx: &egui::Context, chart: RenderedChart) {
        let image = egui::ColorImage::from_rgb(
            [chart.width as usize, chart.height as usize],
            &chart.pixels,
        );
        self.texture = Some(ctx.load_texture(self.name, image, egui::TextureOptions::LINEAR));
        self.error = None;
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.texture = None;
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        if let Some(texture) = &self.texture {
            ui.add(egui::Image::from_texture(texture).max_size(ui.available_size()));
        } else if let Some(error) = &self.error {
            ui.colored_label(ui.visuals().error_fg_color, error);
        } else {
            ui.weak("Click a marker to display its charts.");
        }
    }
}
