use serde::Deserialize;

/// One entry of the points document.
///
/// `plot1` and `plot2` are strings holding serialized chart-definition JSON;
/// they are parsed only when the point's marker is clicked.
#[derive(Debug, Clone, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: String,
    pub plot1: String,
    pub plot2: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_point() {
        let json = r#"{
            "lat": 10.0,
            "lon": 20.0,
            "timestamp": "t1",
            "plot1": "{\"data\":[]}",
            "plot2": "{\"data\":[]}"
        }"#;

        let point: Point = serde_json::from_str(json).expect("point should parse");
        assert_eq!(point.lat, 10.0);
        assert_eq!(point.lon, 20.0);
        assert_eq!(point.timestamp, "t1");
        assert_eq!(point.plot1, r#"{"data":[]}"#);
        assert_eq!(point.plot2, r#"{"data":[]}"#);
    }

    #[test]
    fn test_deserialize_point_array() {
        let json = r#"[
            {"lat": 1.0, "lon": 2.0, "timestamp": "a", "plot1": "{}", "plot2": "{}"},
            {"lat": 3.0, "lon": 4.0, "timestamp": "b", "plot1": "{}", "plot2": "{}"}
        ]"#;

        let points: Vec<Point> = serde_json::from_str(json).expect("array should parse");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, "a");
        assert_eq!(points[1].lat, 3.0);
    }

    #[test]
    fn test_empty_array() {
        let points: Vec<Point> = serde_json::from_str("[]").expect("empty array is valid");
        assert!(points.is_empty());
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let json = r#"{"lat": 1.0, "lon": 2.0, "timestamp": "a", "plot1": "{}"}"#;
        assert!(serde_json::from_str::<Point>(json).is_err());
    }
}
