//! Renders a parsed chart definition into an RGB pixel buffer with
//! plotters. Numeric and time x axes get separate draw paths; bar traces
//! always go through the numeric path.

use chrono::{DateTime, Duration, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

use crate::models::chart::{parse_datetime, ChartDefinition, Coord, Trace, XAxisKind};

/// Render size for the graph slots.
pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 360;

/// Series colors, one per trace in order.
const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to draw chart: {0}")]
    Draw(String),
}

/// A finished chart render, RGB row-major.
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// Render a chart definition at the given pixel size.
///
/// Every call produces a complete new image; there is no diffing against a
/// previous render.
pub fn render_definition(
    def: &ChartDefinition,
    width: u32,
    height: u32,
) -> Result<RenderedChart, ChartError> {
    let mut pixels = vec![255u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        match def.x_axis_kind() {
            XAxisKind::Time => draw_time_chart(&root, def)?,
            XAxisKind::Numeric => draw_numeric_chart(&root, def)?,
        }

        root.present().map_err(draw_err)?;
    }

    Ok(RenderedChart {
        width,
        height,
        pixels,
    })
}

/// X/Y pairs for the numeric path. Missing or non-numeric x values fall
/// back to the value's index.
fn numeric_points(trace: &Trace) -> Vec<(f64, f64)> {
    trace
        .y
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let x = match trace.x.get(i) {
                Some(Coord::Number(v)) => *v,
                _ => i as f64,
            };
            (x, y)
        })
        .collect()
}

/// X/Y pairs for the time path. The axis-kind check guarantees every x
/// value parses; anything that does not is skipped.
fn time_points(trace: &Trace) -> Vec<(DateTime<Utc>, f64)> {
    trace
        .y
        .iter()
        .enumerate()
        .filter_map(|(i, &y)| match trace.x.get(i) {
            Some(Coord::Text(s)) => parse_datetime(s).map(|t| (t, y)),
            _ => None,
        })
        .collect()
}

fn y_range(values: impl Iterator<Item = f64>, include_zero: bool) -> std::ops::Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }

    // Pad the range so extremes do not sit on the frame.
    let span = (max - min).max(1e-8);
    let padding = span * 0.1;
    (min - padding)..(max + padding)
}

fn x_range_numeric(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    let padding = if span < 1e-8 { 0.5 } else { span * 0.05 };
    (min - padding)..(max + padding)
}

/// Half width for bars, from the smallest gap between x positions.
fn bar_half_width(points: &[(f64, f64)]) -> f64 {
    let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    xs.sort_by(f64::total_cmp);
    let min_gap = xs
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(f64::INFINITY, f64::min);
    if min_gap.is_finite() {
        min_gap * 0.4
    } else {
        0.4
    }
}

fn draw_numeric_chart(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    def: &ChartDefinition,
) -> Result<(), ChartError> {
    let series: Vec<Vec<(f64, f64)>> = def.data.iter().map(numeric_points).collect();
    let has_bars = def.data.iter().any(Trace::is_bar);

    let x_spec = x_range_numeric(series.iter().flatten().map(|p| p.0));
    let y_spec = y_range(series.iter().flatten().map(|p| p.1), has_bars);

    let mut builder = ChartBuilder::on(root);
    builder.margin(12).x_label_area_size(36).y_label_area_size(52);
    if let Some(title) = def.title() {
        builder.caption(title, ("sans-serif", 24.0).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(x_spec, y_spec)
        .map_err(draw_err)?;

    let mut mesh = chart.configure_mesh();
    if let Some(x_title) = def.x_title() {
        mesh.x_desc(x_title);
    }
    if let Some(y_title) = def.y_title() {
        mesh.y_desc(y_title);
    }
    mesh.draw().map_err(draw_err)?;

    let mut has_labels = false;
    for (i, (trace, points)) in def.data.iter().zip(&series).enumerate() {
        let color = PALETTE[i % PALETTE.len()];

        if trace.is_bar() {
            let half = bar_half_width(points);
            let anno = chart
                .draw_series(points.iter().map(|&(x, y)| {
                    let (y0, y1) = if y >= 0.0 { (0.0, y) } else { (y, 0.0) };
                    Rectangle::new([(x - half, y0), (x + half, y1)], color.mix(0.7).filled())
                }))
                .map_err(draw_err)?;
            if let Some(name) = &trace.name {
                has_labels = true;
                anno.label(name).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.mix(0.7).filled())
                });
            }
            continue;
        }

        let mut labeled = false;
        if trace.draws_lines() {
            let anno = chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                .map_err(draw_err)?;
            if let Some(name) = &trace.name {
                has_labels = true;
                labeled = true;
                anno.label(name).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            }
        }
        if trace.draws_markers() {
            let anno = chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
                .map_err(draw_err)?;
            if let (Some(name), false) = (&trace.name, labeled) {
                has_labels = true;
                anno.label(name)
                    .legend(move |(x, y)| Circle::new((x + 8, y), 3, color.filled()));
            }
        }
    }

    if has_labels {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;
    }

    Ok(())
}

fn draw_time_chart(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    def: &ChartDefinition,
) -> Result<(), ChartError> {
    let series: Vec<Vec<(DateTime<Utc>, f64)>> = def.data.iter().map(time_points).collect();

    let mut x_min: Option<DateTime<Utc>> = None;
    let mut x_max: Option<DateTime<Utc>> = None;
    for &(t, _) in series.iter().flatten() {
        x_min = Some(x_min.map_or(t, |m| m.min(t)));
        x_max = Some(x_max.map_or(t, |m| m.max(t)));
    }
    // The time path is only entered with at least one parsed x value.
    let (Some(mut x_min), Some(mut x_max)) = (x_min, x_max) else {
        return draw_numeric_chart(root, def);
    };
    if x_min == x_max {
        x_min -= Duration::minutes(1);
        x_max += Duration::minutes(1);
    } else {
        let pad = (x_max - x_min) / 20;
        x_min -= pad;
        x_max += pad;
    }

    let y_spec = y_range(series.iter().flatten().map(|p| p.1), false);

    let mut builder = ChartBuilder::on(root);
    builder.margin(12).x_label_area_size(36).y_label_area_size(52);
    if let Some(title) = def.title() {
        builder.caption(title, ("sans-serif", 24.0).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_spec)
        .map_err(draw_err)?;

    let mut mesh = chart.configure_mesh();
    if let Some(x_title) = def.x_title() {
        mesh.x_desc(x_title);
    }
    if let Some(y_title) = def.y_title() {
        mesh.y_desc(y_title);
    }
    mesh.draw().map_err(draw_err)?;

    let mut has_labels = false;
    for (i, (trace, points)) in def.data.iter().zip(&series).enumerate() {
        let color = PALETTE[i % PALETTE.len()];

        let mut labeled = false;
        if trace.draws_lines() {
            let anno = chart
                .draw_series(LineSeries::new(points.iter().cloned(), color.stroke_width(2)))
                .map_err(draw_err)?;
            if let Some(name) = &trace.name {
                has_labels = true;
                labeled = true;
                anno.label(name).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            }
        }
        if trace.draws_markers() {
            let anno = chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
                .map_err(draw_err)?;
            if let (Some(name), false) = (&trace.name, labeled) {
                has_labels = true;
                anno.label(name)
                    .legend(move |(x, y)| Circle::new((x + 8, y), 3, color.filled()));
            }
        }
    }

    if has_labels {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;
    }

    Ok(())
}
