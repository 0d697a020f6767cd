//! Station trend maps and interpolated surface maps (lon/lat axes)

use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use raintrend_algorithms::interpolation::{CellStatus, TrendSurface};
use raintrend_colormap::ColormapParams;
use raintrend_core::records::StationPoint;
use raintrend_core::{BoundaryRegion, Error, Result, Transformer, CRS};
use std::ops::Range;

use crate::style::{draw_colorbar, padded, plot_error, point_bounds, rgb, union, MapStyle, FONT, LAND};

/// Map extent in degrees covering the boundary and every station
fn extent(
    boundary: Option<&BoundaryRegion>,
    stations: &[StationPoint],
    pad: f64,
) -> Result<(Range<f64>, Range<f64>)> {
    let boundary = boundary.map(BoundaryRegion::bounds).transpose()?;
    let stations = point_bounds(stations.iter().map(|s| (s.longitude, s.latitude)));
    let (min_x, min_y, max_x, max_y) =
        padded(union(boundary, stations).ok_or(Error::NoSourcePoints)?, pad);
    Ok((min_x..max_x, min_y..max_y))
}

/// Stations coloured by their trend value on a lon/lat map.
///
/// Stations with a p-value below `style.significance` are ringed. `note`
/// is drawn in the upper-left corner (e.g. the months of a season).
pub fn station_trend_map(
    stations: &[StationPoint],
    boundary: Option<&BoundaryRegion>,
    colors: &ColormapParams,
    title: &str,
    note: Option<&str>,
    style: &MapStyle,
) -> Result<String> {
    let (x_range, y_range) = extent(boundary, stations, style.pad_deg)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let (map_area, bar_area) = root.split_horizontally(style.width.saturating_sub(style.colorbar_width));

        let mut chart = ChartBuilder::on(&map_area)
            .caption(title, (FONT, 20))
            .margin(20)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_labels(7)
            .y_labels(8)
            .x_desc("Longitude")
            .y_desc("Latitude")
            .x_label_formatter(&|v| format!("{v:.1}°E"))
            .y_label_formatter(&|v| format!("{v:.1}°N"))
            .light_line_style(WHITE.mix(0.0))
            .draw()
            .map_err(plot_error)?;

        if let Some(region) = boundary {
            fill_region(&mut chart, region).map_err(plot_error)?;
            outline_region(&mut chart, region).map_err(plot_error)?;
        }

        let marker = style.marker_size;
        chart
            .draw_series(stations.iter().filter_map(|s| {
                let color = colors.color(s.value)?;
                Some(Circle::new((s.longitude, s.latitude), marker, rgb(color).filled()))
            }))
            .map_err(plot_error)?;
        chart
            .draw_series(
                stations
                    .iter()
                    .map(|s| Circle::new((s.longitude, s.latitude), marker, BLACK.stroke_width(1))),
            )
            .map_err(plot_error)?;

        let significance = style.significance;
        chart
            .draw_series(
                stations
                    .iter()
                    .filter(|s| s.p_value.is_some_and(|p| p < significance))
                    .map(|s| Circle::new((s.longitude, s.latitude), marker + 5, BLACK.stroke_width(2))),
            )
            .map_err(plot_error)?
            .label(format!("Significant (p < {significance})"))
            .legend(|(x, y)| Circle::new((x, y), 5, BLACK.stroke_width(2)));

        if style.labels {
            let dx = (x_range.end - x_range.start) * 0.008;
            chart
                .draw_series(stations.iter().map(|s| {
                    Text::new(
                        s.station.clone(),
                        (s.longitude + dx, s.latitude + dx),
                        (FONT, 11).into_font(),
                    )
                }))
                .map_err(plot_error)?;
        }

        if let Some(note) = note {
            let at = (
                x_range.start + (x_range.end - x_range.start) * 0.03,
                y_range.end - (y_range.end - y_range.start) * 0.03,
            );
            chart
                .draw_series(std::iter::once(Text::new(
                    note.to_string(),
                    at,
                    (FONT, 14).into_font().style(FontStyle::Bold),
                )))
                .map_err(plot_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;

        draw_colorbar(&bar_area, colors, &style.value_label).map_err(plot_error)?;
        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

/// An interpolated trend surface with the boundary outline and stations.
///
/// Each estimated grid cell is drawn as its planar footprint carried back
/// to lon/lat; undefined cells are left blank.
pub fn interpolated_map(
    surface: &TrendSurface,
    boundary: &BoundaryRegion,
    stations: &[StationPoint],
    colors: &ColormapParams,
    title: &str,
    style: &MapStyle,
) -> Result<String> {
    let (x_range, y_range) = extent(Some(boundary), stations, style.pad_deg)?;
    let to_geographic = Transformer::new(surface.crs, CRS::wgs84())?;
    let grid = surface.grid();
    let (hx, hy) = (grid.dx() / 2.0, grid.dy() / 2.0);

    let cells: Vec<_> = (0..grid.len())
        .filter(|&i| surface.field.status[i] == CellStatus::Estimate)
        .filter_map(|i| {
            let color = colors.color(surface.field.values[i])?;
            let (x, y) = grid.point(i);
            let sw = to_geographic.transform(x - hx, y - hy);
            let ne = to_geographic.transform(x + hx, y + hy);
            Some(Rectangle::new([sw, ne], rgb(color).filled()))
        })
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let (map_area, bar_area) = root.split_horizontally(style.width.saturating_sub(style.colorbar_width));

        let mut chart = ChartBuilder::on(&map_area)
            .caption(title, (FONT, 18))
            .margin(20)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_labels(7)
            .y_labels(8)
            .x_desc("Longitude")
            .y_desc("Latitude")
            .x_label_formatter(&|v| format!("{v:.1}°E"))
            .y_label_formatter(&|v| format!("{v:.1}°N"))
            .light_line_style(WHITE.mix(0.0))
            .draw()
            .map_err(plot_error)?;

        fill_region(&mut chart, boundary).map_err(plot_error)?;
        chart.draw_series(cells).map_err(plot_error)?;
        outline_region(&mut chart, boundary).map_err(plot_error)?;

        let marker = style.marker_size.saturating_sub(2).max(2);
        chart
            .draw_series(
                stations
                    .iter()
                    .map(|s| Circle::new((s.longitude, s.latitude), marker + 1, WHITE.filled())),
            )
            .map_err(plot_error)?;
        chart
            .draw_series(
                stations
                    .iter()
                    .map(|s| Circle::new((s.longitude, s.latitude), marker, BLACK.filled())),
            )
            .map_err(plot_error)?;

        draw_colorbar(&bar_area, colors, &style.value_label).map_err(plot_error)?;
        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

type LonLat = Cartesian2d<RangedCoordf64, RangedCoordf64>;
type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Land fill under every part; holes are left to the outline
fn fill_region<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, LonLat>,
    region: &BoundaryRegion,
) -> DrawResult<DB> {
    chart.draw_series(region.polygons().iter().map(|part| {
        let ring: Vec<(f64, f64)> = part.exterior().coords().map(|c| (c.x, c.y)).collect();
        Polygon::new(ring, LAND.filled())
    }))?;
    Ok(())
}

fn outline_region<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, LonLat>,
    region: &BoundaryRegion,
) -> DrawResult<DB> {
    chart.draw_series(
        region
            .rings()
            .into_iter()
            .map(|ring| PathElement::new(ring, BLACK.stroke_width(1))),
    )?;
    Ok(())
}
