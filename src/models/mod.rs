//! Data models for the viewer.
//!
//! `point` holds the records deserialized from the points document,
//! `chart` holds the parsed form of a plot payload.

pub mod chart;
pub mod point;

// Re-export commonly used types for convenience
pub use chart::ChartDefinition;
pub use point::Point;
