pub mod chart_service;
pub mod loader;
pub mod tile_service;

use lazy_static::lazy_static;

lazy_static! {
    /// Shared HTTP client for the points document and tile requests.
    /// Tile providers require a meaningful user agent.
    pub static ref HTTP_CLIENT: reqwest::Client = reqwest::Client::builder()
        .user_agent(concat!("pointmap/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client");
}
