//! One-shot retrieval of the points document.

use thiserror::Error;
use tracing::info;

use crate::models::Point;

/// Errors from loading the points document.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("request for points failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed points document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse a points document body into point records.
pub fn parse_points(body: &str) -> Result<Vec<Point>, LoaderError> {
    Ok(serde_json::from_str(body)?)
}

/// Load the points document from an `http(s)://` URL or a file path.
///
/// Issued exactly once at startup. No retries, no timeout; on failure the
/// caller keeps an empty map.
pub async fn load_points(source: &str) -> Result<Vec<Point>, LoaderError> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        super::HTTP_CLIENT
            .get(source)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| LoaderError::Io {
                path: source.to_string(),
                source: e,
            })?
    };

    let points = parse_points(&body)?;
    info!("loaded {} points from {}", points.len(), source);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"lat": 10.0, "lon": 20.0, "timestamp": "t1",
         "plot1": "{\"data\":[]}", "plot2": "{\"data\":[]}"}
    ]"#;

    #[test]
    fn test_parse_points() {
        let points = parse_points(SAMPLE).expect("sample should parse");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lat, 10.0);
        assert_eq!(points[0].lon, 20.0);
    }

    #[test]
    fn test_parse_points_empty() {
        assert!(parse_points("[]").expect("empty is valid").is_empty());
    }

    #[test]
    fn test_parse_points_malformed() {
        assert!(matches!(parse_points("{not json"), Err(LoaderError::Parse(_))));
        assert!(matches!(parse_points(r#"{"lat": 1}"#), Err(LoaderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_load_points_from_file() {
        let path = std::env::temp_dir().join("pointmap_loader_test.json");
        tokio::fs::write(&path, SAMPLE).await.expect("write sample");

        let points = load_points(path.to_str().unwrap()).await.expect("load sample");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, "t1");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_points_missing_file() {
        let result = load_points("/nonexistent/pointmap/points.json").await;
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }
}
