use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const CANVAS_SIZE: (u32, u32) = (680, 540);

/// One labelled curve.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Series {
            label: label.into(),
            points,
        }
    }

    /// Constant horizontal marker spanning the x range of another series.
    pub fn horizontal_marker(label: impl Into<String>, x_range: (f64, f64), y: f64) -> Self {
        Series {
            label: label.into(),
            points: vec![(x_range.0, y), (x_range.1, y)],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartSpec<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
}

/// Render one multi-series chart to the requested backends.
pub fn render_chart(
    png: Option<&Path>,
    svg: Option<&Path>,
    spec: ChartSpec<'_>,
    series: &[Series],
) -> Result<()> {
    if series.iter().all(|s| s.points.is_empty()) {
        return Err(anyhow!("No samples available for chart '{}'", spec.title));
    }

    if let Some(path) = png {
        ensure_parent(path)?;
        let backend = BitMapBackend::new(path, CANVAS_SIZE);
        draw_chart(backend.into_drawing_area(), spec, series)?;
    }

    if let Some(path) = svg {
        ensure_parent(path)?;
        let backend = SVGBackend::new(path, CANVAS_SIZE);
        draw_chart(backend.into_drawing_area(), spec, series)?;
    }

    Ok(())
}

fn draw_chart<DB: DrawingBackend>(
    drawing_area: DrawingArea<DB, Shift>,
    spec: ChartSpec<'_>,
    series: &[Series],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = min_max(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let (y_min, y_max) = min_max(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    let y_span = (y_max - y_min).abs();
    let y_padding = if y_span < 1e-9 {
        y_max.abs().max(1.0) * 0.05
    } else {
        y_span * 0.05
    };
    let y_lower = y_min - y_padding;
    let y_upper = y_max + y_padding;

    let root = drawing_area;
    root.fill(&WHITE)?;

    let (title_area, chart_area) = root.split_vertically(36);
    let title_style_base = ("sans-serif", 28).into_text_style(&title_area);
    let title_style = title_style_base.pos(Pos::new(HPos::Center, VPos::Center));
    let title_dims = title_area.dim_in_pixel();
    title_area.draw_text(
        spec.title,
        &title_style,
        (title_dims.0 as i32 / 2, title_dims.1 as i32 / 2),
    )?;

    let mut chart = ChartBuilder::on(&chart_area)
        .margin_left(52)
        .margin_right(18)
        .margin_bottom(40)
        .margin_top(6)
        .set_label_area_size(LabelAreaPosition::Left, 58)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_min..x_max, y_lower..y_upper)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .x_label_formatter(&|value| format_decimal_tick(*value))
        .y_label_formatter(&|value| format_decimal_tick(*value))
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 20))
        .draw()?;

    for (index, curve) in series.iter().enumerate() {
        let color = Palette99::pick(index);
        chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(2),
            ))?
            .label(curve.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .background_style(WHITE.mix(0.85))
            .label_font(("sans-serif", 16))
            .draw()?;
    }

    chart.draw_series(std::iter::once(PathElement::new(
        vec![
            (x_min, y_lower),
            (x_max, y_lower),
            (x_max, y_upper),
            (x_min, y_upper),
            (x_min, y_lower),
        ],
        &BLACK,
    )))?;

    chart_area
        .present()
        .map_err(|e| anyhow!("Failed to render chart '{}': {:?}", spec.title, e))?;
    Ok(())
}

fn min_max<I>(values: I) -> (f64, f64)
where
    I: Iterator<Item = f64>,
{
    let mut iter = values.peekable();
    if iter.peek().is_none() {
        return (0.0, 1.0);
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for val in iter {
        if val < min {
            min = val;
        }
        if val > max {
            max = val;
        }
    }

    if (max - min).abs() < f64::EPSILON {
        let epsilon = if min.abs() < 1.0 {
            1.0
        } else {
            min.abs() * 0.05
        };
        (min - epsilon, max + epsilon)
    } else {
        (min, max)
    }
}

fn format_decimal_tick(value: f64) -> String {
    if value.abs() >= 1e4 || (value != 0.0 && value.abs() < 1e-3) {
        format!("{:.1e}", value)
    } else {
        format!("{:.6}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create plot directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_pads_degenerate_ranges() {
        let (min, max) = min_max([3.0, 3.0, 3.0].into_iter());
        assert!(min < 3.0);
        assert!(max > 3.0);
    }

    #[test]
    fn min_max_of_empty_input_is_unit_range() {
        assert_eq!(min_max(std::iter::empty()), (0.0, 1.0));
    }

    #[test]
    fn decimal_ticks_drop_trailing_zeros() {
        assert_eq!(format_decimal_tick(0.25), "0.25");
        assert_eq!(format_decimal_tick(2.0), "2");
        assert_eq!(format_decimal_tick(12345.0), "1.2e4");
    }

    #[test]
    fn horizontal_marker_spans_the_given_range() {
        let marker = Series::horizontal_marker("weight", (0.0, 30.0), 900.0);
        assert_eq!(marker.points, vec![(0.0, 900.0), (30.0, 900.0)]);
    }
}
