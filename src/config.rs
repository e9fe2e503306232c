//! Viewer configuration. Values can be overridden through environment
//! variables (loaded from `.env` when present); defaults match the fixed
//! values the viewer shipped with: the `points.json` source, the public
//! OSM tile layer and a world view centered on (0, 0) at zoom 2.

pub const DEFAULT_POINTS_SOURCE: &str = "points.json";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Zoom levels the tile provider serves.
pub const MAX_ZOOM: u8 = 19;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub points_source: String,
    pub tile_url: String,
    pub attribution: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            points_source: DEFAULT_POINTS_SOURCE.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            center_lat: 0.0,
            center_lon: 0.0,
            zoom: 2,
        }
    }
}

impl ViewerConfig {
    /// Build the config from the environment, falling back to defaults for
    /// missing or malformed values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            points_source: std::env::var("POINTMAP_POINTS")
                .unwrap_or(defaults.points_source),
            tile_url: std::env::var("POINTMAP_TILE_URL").unwrap_or(defaults.tile_url),
            attribution: std::env::var("POINTMAP_ATTRIBUTION")
                .unwrap_or(defaults.attribution),
            center_lat: env_parse("POINTMAP_LAT", defaults.center_lat),
            center_lon: env_parse("POINTMAP_LON", defaults.center_lon),
            zoom: env_parse("POINTMAP_ZOOM", defaults.zoom).min(MAX_ZOOM),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.points_source, "points.json");
        assert_eq!(config.center_lat, 0.0);
        assert_eq!(config.center_lon, 0.0);
        assert_eq!(config.zoom, 2);
        assert!(config.tile_url.contains("{z}"));
    }

    #[test]
    fn test_env_parse_fallback() {
        // Unset and malformed values both fall back.
        assert_eq!(env_parse("POINTMAP_TEST_UNSET_KEY", 7u8), 7);

        std::env::set_var("POINTMAP_TEST_BAD_ZOOM", "not-a-number");
        assert_eq!(env_parse("POINTMAP_TEST_BAD_ZOOM", 2u8), 2);

        std::env::set_var("POINTMAP_TEST_GOOD_ZOOM", "5");
        assert_eq!(env_parse("POINTMAP_TEST_GOOD_ZOOM", 2u8), 5);
    }
}
