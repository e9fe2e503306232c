use std::f64::consts::PI;

/// Tile edge length in pixels, matching standard slippy-map tiles.
pub const TILE_SIZE: u32 = 256;

/// Latitudes beyond this cannot be represented in Web Mercator.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Width (and height) of the projected world in pixels at the given zoom.
pub fn world_size(zoom: u8) -> f64 {
    f64::from(TILE_SIZE) * f64::from(1u32 << zoom)
}

/// Project a latitude/longitude pair to world pixel coordinates at a zoom
/// level (Web Mercator). Latitude is clamped to the projectable range.
pub fn project(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`]: world pixel coordinates back to latitude and
/// longitude. The y coordinate is clamped to the world, longitude is
/// normalized into `[-180, 180)`.
pub fn unproject(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let y = y.clamp(0.0, size);

    let lon = normalize_lon(x / size * 360.0 - 180.0);
    let n = PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    (lat, lon)
}

/// Wrap a longitude into `[-180, 180)`.
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
