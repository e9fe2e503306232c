//! Slippy-map tile plumbing: tile addressing, background fetching and
//! decoding. Decoded tiles cross back to the UI thread over a channel.

use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};

use thiserror::Error;
use tracing::{debug, warn};

use crate::utils::geo::TILE_SIZE;

/// Address of one tile in the slippy scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

/// A fetched and decoded tile, RGBA row-major.
pub struct TileImage {
    pub id: TileId,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TileError {
    #[error("tile request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode tile image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Raw (unwrapped) tile index range covering `span` world pixels starting
/// at `world_min`.
pub fn tile_range(world_min: f64, span: f64) -> (i64, i64) {
    let tile = f64::from(TILE_SIZE);
    let first = (world_min / tile).floor() as i64;
    let last = ((world_min + span) / tile).floor() as i64;
    (first, last)
}

/// Map a raw tile index to a fetchable tile id. X wraps around the world,
/// Y outside the world has no tile.
pub fn wrap_tile(raw_x: i64, raw_y: i64, zoom: u8) -> Option<TileId> {
    let n = 1i64 << zoom;
    if raw_y < 0 || raw_y >= n {
        return None;
    }
    Some(TileId {
        x: raw_x.rem_euclid(n) as u32,
        y: raw_y as u32,
        z: zoom,
    })
}

/// Fill a tile URL template (`{s}`, `{z}`, `{x}`, `{y}` placeholders).
pub fn tile_url(template: &str, id: TileId) -> String {
    let subdomain = ["a", "b", "c"][((id.x + id.y) % 3) as usize];
    template
        .replace("{s}", subdomain)
        .replace("{z}", &id.z.to_string())
        .replace("{x}", &id.x.to_string())
        .replace("{y}", &id.y.to_string())
}

/// Fetches tiles in the background, at most once per tile id.
///
/// Failed fetches are logged and not retried; the tile slot simply stays
/// empty.
pub struct TileFetcher {
    url_template: String,
    runtime: tokio::runtime::Handle,
    tx: Sender<TileImage>,
    rx: Receiver<TileImage>,
    requested: HashSet<TileId>,
}

impl TileFetcher {
    pub fn new(url_template: String, runtime: tokio::runtime::Handle) -> Self {
        let (tx, rx) = channel();
        Self {
            url_template,
            runtime,
            tx,
            rx,
            requested: HashSet::new(),
        }
    }

    /// Request a tile unless it is already requested or delivered.
    pub fn request(&mut self, id: TileId, ctx: &egui::Context) {
        if !self.requested.insert(id) {
            return;
        }

        let url = tile_url(&self.url_template, id);
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        debug!("fetching tile {}/{}/{}", id.z, id.x, id.y);

        self.runtime.spawn(async move {
            match fetch_tile(&url, id).await {
                Ok(tile) => {
                    let _ = tx.send(tile);
                    ctx.request_repaint();
                }
                Err(e) => warn!("tile {}/{}/{} failed: {}", id.z, id.x, id.y, e),
            }
        });
    }

    /// Drain tiles that finished since the last frame.
    pub fn poll(&mut self) -> Vec<TileImage> {
        let mut delivered = Vec::new();
        while let Ok(tile) = self.rx.try_recv() {
            delivered.push(tile);
        }
        delivered
    }
}

async fn fetch_tile(url: &str, id: TileId) -> Result<TileImage, TileError> {
    let bytes = super::HTTP_CLIENT
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok(TileImage {
        id,
        width,
        height,
        rgba: decoded.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_range() {
        // One tile exactly.
        assert_eq!(tile_range(0.0, 255.0), (0, 0));
        // Crossing a tile boundary.
        assert_eq!(tile_range(100.0, 300.0), (0, 1));
        // Negative world coordinates (panned past the date line).
        assert_eq!(tile_range(-10.0, 300.0), (-1, 1));
    }

    #[test]
    fn test_wrap_tile() {
        assert_eq!(
            wrap_tile(-1, 0, 2),
            Some(TileId { x: 3, y: 0, z: 2 })
        );
        assert_eq!(
            wrap_tile(5, 1, 2),
            Some(TileId { x: 1, y: 1, z: 2 })
        );
        assert_eq!(wrap_tile(0, -1, 2), None);
        assert_eq!(wrap_tile(0, 4, 2), None);
    }

    #[test]
    fn test_tile_url() {
        let id = TileId { x: 2, y: 1, z: 3 };
        assert_eq!(
            tile_url("https://tile.openstreetmap.org/{z}/{x}/{y}.png", id),
            "https://tile.openstreetmap.org/3/2/1.png"
        );

        // Subdomain rotation is stable per tile.
        let url = tile_url("https://{s}.tiles.example/{z}/{x}/{y}.png", id);
        assert_eq!(url, "https://a.tiles.example/3/2/1.png");
    }
}
