pub mod app;
pub mod graph_panel;
pub mod map_view;

pub use app::ViewerApp;
