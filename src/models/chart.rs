//! Parsed form of a plot payload.
//!
//! Payloads follow the common plotly shape: `{"data": [traces...],
//! "layout": {...}}`. Only the parts the renderer understands are modeled;
//! unknown fields are ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// A chart definition as carried inside a point's `plot1`/`plot2` string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartDefinition {
    #[serde(default)]
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Option<Layout>,
}

/// One series of a chart definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub x: Vec<Coord>,
    #[serde(default)]
    pub y: Vec<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// An x coordinate: either a number or a string (typically a date).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Number(f64),
    Text(String),
}

/// Chart layout options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub title: Option<Title>,
    #[serde(default)]
    pub xaxis: Option<AxisSpec>,
    #[serde(default)]
    pub yaxis: Option<AxisSpec>,
}

/// A title, which plotly accepts as either a bare string or `{"text": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Title {
    Text(String),
    Nested { text: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AxisSpec {
    #[serde(default)]
    pub title: Option<Title>,
}

/// Which kind of x axis a definition needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxisKind {
    Numeric,
    Time,
}

impl Title {
    pub fn text(&self) -> &str {
        match self {
            Title::Text(s) => s,
            Title::Nested { text } => text,
        }
    }
}

impl Trace {
    pub fn is_bar(&self) -> bool {
        self.kind.as_deref() == Some("bar")
    }

    /// Whether the trace draws connecting lines. Scatter traces without an
    /// explicit mode default to lines.
    pub fn draws_lines(&self) -> bool {
        match self.mode.as_deref() {
            Some(mode) => mode.contains("lines"),
            None => !self.is_bar(),
        }
    }

    pub fn draws_markers(&self) -> bool {
        matches!(self.mode.as_deref(), Some(mode) if mode.contains("markers"))
    }
}

impl ChartDefinition {
    pub fn title(&self) -> Option<&str> {
        self.layout.as_ref()?.title.as_ref().map(Title::text)
    }

    pub fn x_title(&self) -> Option<&str> {
        self.layout.as_ref()?.xaxis.as_ref()?.title.as_ref().map(Title::text)
    }

    pub fn y_title(&self) -> Option<&str> {
        self.layout.as_ref()?.yaxis.as_ref()?.title.as_ref().map(Title::text)
    }

    /// Decide the x-axis kind. Time axes are used only when every x value
    /// across all traces is a parseable date string; bar traces always use
    /// the numeric path.
    pub fn x_axis_kind(&self) -> XAxisKind {
        if self.data.iter().any(Trace::is_bar) {
            return XAxisKind::Numeric;
        }

        let mut saw_datetime = false;
        for trace in &self.data {
            for coord in &trace.x {
                match coord {
                    Coord::Number(_) => return XAxisKind::Numeric,
                    Coord::Text(text) => {
                        if parse_datetime(text).is_none() {
                            return XAxisKind::Numeric;
                        }
                        saw_datetime = true;
                    }
                }
            }
        }

        if saw_datetime {
            XAxisKind::Time
        } else {
            XAxisKind::Numeric
        }
    }
}

/// Parse a payload string into a chart definition.
pub fn parse_definition(payload: &str) -> Result<ChartDefinition, serde_json::Error> {
    serde_json::from_str(payload)
}

/// Parse a date string in the formats plot payloads carry in practice:
/// RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD`.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(DateTime::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0)?, Utc));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_definition() {
        let def = parse_definition(r#"{"data":[]}"#).expect("empty data is valid");
        assert!(def.data.is_empty());
        assert!(def.title().is_none());
    }

    #[test]
    fn test_parse_scatter_trace() {
        let def = parse_definition(
            r#"{
                "data": [{"x": [1, 2, 3], "y": [4.0, 5.5, 6.0], "name": "s1", "mode": "lines+markers"}],
                "layout": {"title": "Example"}
            }"#,
        )
        .expect("scatter definition should parse");

        assert_eq!(def.data.len(), 1);
        let trace = &def.data[0];
        assert_eq!(trace.x, vec![Coord::Number(1.0), Coord::Number(2.0), Coord::Number(3.0)]);
        assert_eq!(trace.y, vec![4.0, 5.5, 6.0]);
        assert_eq!(trace.name.as_deref(), Some("s1"));
        assert!(trace.draws_lines());
        assert!(trace.draws_markers());
        assert_eq!(def.title(), Some("Example"));
    }

    #[test]
    fn test_parse_nested_title() {
        let def = parse_definition(
            r#"{"data":[],"layout":{"title":{"text":"Nested"},"yaxis":{"title":"Value"}}}"#,
        )
        .expect("nested title should parse");
        assert_eq!(def.title(), Some("Nested"));
        assert_eq!(def.y_title(), Some("Value"));
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(parse_definition("not json").is_err());
        assert!(parse_definition(r#"{"data": 5}"#).is_err());
    }

    #[test]
    fn test_trace_mode_defaults() {
        let scatter = Trace::default();
        assert!(scatter.draws_lines());
        assert!(!scatter.draws_markers());

        let bar = Trace {
            kind: Some("bar".to_string()),
            ..Trace::default()
        };
        assert!(bar.is_bar());
        assert!(!bar.draws_lines());
    }

    #[test]
    fn test_x_axis_kind() {
        let numeric = parse_definition(r#"{"data":[{"x":[1,2],"y":[1,2]}]}"#).unwrap();
        assert_eq!(numeric.x_axis_kind(), XAxisKind::Numeric);

        let time = parse_definition(
            r#"{"data":[{"x":["2024-01-01","2024-01-02"],"y":[1,2]}]}"#,
        )
        .unwrap();
        assert_eq!(time.x_axis_kind(), XAxisKind::Time);

        // Mixed number/date x values stay numeric.
        let mixed = parse_definition(r#"{"data":[{"x":[1,"2024-01-01"],"y":[1,2]}]}"#).unwrap();
        assert_eq!(mixed.x_axis_kind(), XAxisKind::Numeric);

        // Non-date strings stay numeric (rendered by index).
        let labels = parse_definition(r#"{"data":[{"x":["a","b"],"y":[1,2]}]}"#).unwrap();
        assert_eq!(labels.x_axis_kind(), XAxisKind::Numeric);

        // Bar traces force the numeric path even with date labels.
        let bar = parse_definition(
            r#"{"data":[{"type":"bar","x":["2024-01-01"],"y":[1]}]}"#,
        )
        .unwrap();
        assert_eq!(bar.x_axis_kind(), XAxisKind::Numeric);

        let empty = parse_definition(r#"{"data":[]}"#).unwrap();
        assert_eq!(empty.x_axis_kind(), XAxisKind::Numeric);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-01T12:30:00Z").is_some());
        assert!(parse_datetime("2024-01-01 12:30:00").is_some());
        assert!(parse_datetime("2024-01-01").is_some());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("").is_none());
    }
}
