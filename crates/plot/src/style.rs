//! Layout parameters and drawing helpers shared by all plots

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use raintrend_colormap::{ColormapParams, Rgb};
use raintrend_core::Error;

pub(crate) const FONT: &str = "sans-serif";
pub(crate) const LAND: RGBColor = RGBColor(211, 211, 211);

/// Parameters for the map plots
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    /// Image size in pixels (default: 900 x 1000)
    pub width: u32,
    pub height: u32,
    /// Width reserved for the colour bar (default: 110)
    pub colorbar_width: u32,
    /// Padding around the mapped extent in degrees (default: 0.2)
    pub pad_deg: f64,
    /// Station marker radius in pixels (default: 6)
    pub marker_size: u32,
    /// p-value below which a station is ringed as significant (default: 0.05)
    pub significance: f64,
    /// Draw station names next to the markers (default: true)
    pub labels: bool,
    /// Colour bar caption
    pub value_label: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 1000,
            colorbar_width: 110,
            pad_deg: 0.2,
            marker_size: 6,
            significance: 0.05,
            labels: true,
            value_label: "Sen's slope (mm/year)".to_string(),
        }
    }
}

/// Parameters for the time-series plots
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    /// Image size in pixels (default: 800 x 420)
    pub width: u32,
    pub height: u32,
    /// Trailing window of the monthly rolling mean (default: 12)
    pub rolling_window: usize,
    /// Minimum months present in a window (default: 6)
    pub rolling_min_periods: usize,
}

impl Default for SeriesStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 420,
            rolling_window: 12,
            rolling_min_periods: 6,
        }
    }
}

pub(crate) fn plot_error(e: impl std::fmt::Display) -> Error {
    Error::Other(format!("plot: {e}"))
}

pub(crate) fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Padded (min_x, min_y, max_x, max_y) that is never empty
pub(crate) fn padded(bounds: (f64, f64, f64, f64), pad: f64) -> (f64, f64, f64, f64) {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = bounds;
    let pad = pad.max(1e-6);
    min_x -= pad;
    min_y -= pad;
    max_x += pad;
    max_y += pad;
    (min_x, min_y, max_x, max_y)
}

/// Union of two optional bounding boxes
pub(crate) fn union(
    a: Option<(f64, f64, f64, f64)>,
    b: Option<(f64, f64, f64, f64)>,
) -> Option<(f64, f64, f64, f64)> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))),
        (a, None) => a,
        (None, b) => b,
    }
}

pub(crate) fn point_bounds(points: impl IntoIterator<Item = (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    points
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .fold(None, |acc, (x, y)| union(acc, Some((x, y, x, y))))
}

/// Vertical colour bar filling `area`
pub(crate) fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    colors: &ColormapParams,
    label: &str,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    const STEPS: usize = 128;
    let (lo, hi) = if colors.max > colors.min {
        (colors.min, colors.max)
    } else {
        (colors.min - 0.5, colors.min + 0.5)
    };

    let mut bar = ChartBuilder::on(area)
        .margin_top(80)
        .margin_bottom(80)
        .margin_right(10)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..1f64, lo..hi)?;

    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_labels(8)
        .y_desc(label)
        .y_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;

    let step = (hi - lo) / STEPS as f64;
    bar.draw_series((0..STEPS).filter_map(|i| {
        let v0 = lo + step * i as f64;
        let color = colors.color(v0 + step / 2.0)?;
        Some(Rectangle::new([(0.0, v0), (1.0, v0 + step)], rgb(color).filled()))
    }))?;

    Ok(())
}
