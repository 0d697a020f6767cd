//! Per-station annual and monthly rainfall time-series plots

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use raintrend_algorithms::statistics::{linear_regression, rolling_mean, MannKendall};
use raintrend_core::{Error, Result};
use std::ops::Range;

use crate::style::{plot_error, SeriesStyle, FONT};

const SEN_COLOR: RGBColor = RGBColor(214, 39, 40);
const FIT_COLOR: RGBColor = RGBColor(31, 119, 180);
const ROLLING_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Value axis covering every finite value with 5% headroom
fn value_range(values: impl IntoIterator<Item = f64>) -> Option<Range<f64>> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return None;
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    Some((lo - pad)..(hi + pad))
}

/// Annual totals of one station with a least-squares fit and, when given,
/// the Sen's slope line and the Mann-Kendall result.
///
/// The Sen line passes through the first plotted year. Years with a
/// missing total are left out.
pub fn station_timeseries(
    station: &str,
    years: &[i32],
    rainfall: &[f64],
    mk: Option<&MannKendall>,
    style: &SeriesStyle,
) -> Result<String> {
    if years.len() != rainfall.len() {
        return Err(Error::LengthMismatch {
            points: years.len(),
            values: rainfall.len(),
        });
    }
    let points: Vec<(f64, f64)> = years
        .iter()
        .zip(rainfall)
        .filter(|(_, r)| r.is_finite())
        .map(|(&y, &r)| (f64::from(y), r))
        .collect();
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Err(Error::InsufficientData { needed: 1, found: 0 });
    };
    let y_range = value_range(points.iter().map(|p| p.1)).ok_or(Error::NoSourcePoints)?;
    let x_range = (first.0 - 1.0)..(last.0 + 1.0);

    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let fit = linear_regression(&xs, &ys).ok();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{station}: annual rainfall"), (FONT, 20))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range.clone())
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Rainfall (mm)")
            .x_label_formatter(&|v| format!("{v:.0}"))
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, BLACK.filled())))
            .map_err(plot_error)?
            .label("Annual total")
            .legend(|(x, y)| Circle::new((x + 10, y), 3, BLACK.filled()));

        if let Some(fit) = fit {
            chart
                .draw_series(LineSeries::new(
                    [first.0, last.0].map(|x| (x, fit.intercept + fit.slope * x)),
                    FIT_COLOR.stroke_width(2),
                ))
                .map_err(plot_error)?
                .label(format!("Linear fit ({:.2} mm/yr)", fit.slope))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], FIT_COLOR));
        }

        if let Some(mk) = mk.filter(|mk| mk.slope.is_finite()) {
            chart
                .draw_series(LineSeries::new(
                    [first.0, last.0].map(|x| (x, mk.slope * (x - first.0) + first.1)),
                    SEN_COLOR.stroke_width(2),
                ))
                .map_err(plot_error)?
                .label(format!("Sen's slope ({:.2} mm/yr)", mk.slope))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SEN_COLOR));

            let at = (first.0, y_range.end - (y_range.end - y_range.start) * 0.04);
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("MK: {}, tau = {:.3}, p = {:.3}", mk.trend, mk.tau, mk.p),
                    at,
                    (FONT, 13).into_font(),
                )))
                .map_err(plot_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

fn decimal_year(date: NaiveDate) -> f64 {
    f64::from(date.year()) + f64::from(date.month0()) / 12.0
}

/// Consecutive finite stretches of a series, one polyline each
fn finite_runs(points: impl IntoIterator<Item = (f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = vec![Vec::new()];
    for (x, y) in points {
        if y.is_finite() {
            if let Some(run) = runs.last_mut() {
                run.push((x, y));
            }
        } else if runs.last().is_some_and(|run| !run.is_empty()) {
            runs.push(Vec::new());
        }
    }
    runs.retain(|run| !run.is_empty());
    runs
}

/// Monthly totals of one station with a trailing rolling mean.
///
/// `series` is a gap-filled month-by-month series; NaN months break the
/// line.
pub fn monthly_timeseries(station: &str, series: &[(NaiveDate, f64)], style: &SeriesStyle) -> Result<String> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(Error::InsufficientData { needed: 1, found: 0 });
    };
    let y_range = value_range(series.iter().map(|p| p.1)).ok_or(Error::NoSourcePoints)?;
    let x_range = decimal_year(first.0)..(decimal_year(last.0) + 1.0 / 12.0);

    let values: Vec<f64> = series.iter().map(|p| p.1).collect();
    let rolled = rolling_mean(&values, style.rolling_window, style.rolling_min_periods);
    let x: Vec<f64> = series.iter().map(|p| decimal_year(p.0)).collect();
    let monthly_runs = finite_runs(x.iter().copied().zip(values.iter().copied()));
    let rolling_runs = finite_runs(x.iter().copied().zip(rolled));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{station}: monthly rainfall"), (FONT, 20))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Rainfall (mm)")
            .x_label_formatter(&|v| format!("{v:.0}"))
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(
                monthly_runs
                    .into_iter()
                    .map(|run| PathElement::new(run, FIT_COLOR.mix(0.6).stroke_width(1))),
            )
            .map_err(plot_error)?
            .label("Monthly total")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], FIT_COLOR));

        chart
            .draw_series(
                rolling_runs
                    .into_iter()
                    .map(|run| PathElement::new(run, ROLLING_COLOR.stroke_width(2))),
            )
            .map_err(plot_error)?
            .label(format!("{}-month rolling mean", style.rolling_window))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ROLLING_COLOR));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raintrend_algorithms::statistics::mann_kendall;

    #[test]
    fn runs_split_on_gaps() {
        let runs = finite_runs(vec![
            (0.0, f64::NAN),
            (1.0, 1.0),
            (2.0, 2.0),
            (3.0, f64::NAN),
            (4.0, f64::NAN),
            (5.0, 5.0),
        ]);
        assert_eq!(runs, vec![vec![(1.0, 1.0), (2.0, 2.0)], vec![(5.0, 5.0)]]);
        assert!(finite_runs(vec![(0.0, f64::NAN)]).is_empty());
    }

    #[test]
    fn decimal_years() {
        let d = NaiveDate::from_ymd_opt(2001, 7, 1).unwrap();
        assert!((decimal_year(d) - 2001.5).abs() < 1e-12);
    }

    #[test]
    fn annual_plot_svg() {
        let years: Vec<i32> = (1990..2010).collect();
        let rain: Vec<f64> = years
            .iter()
            .map(|&y| 2000.0 + 15.0 * f64::from(y - 1990) + if y % 2 == 0 { 40.0 } else { -40.0 })
            .collect();
        let mk = mann_kendall(&rain, 0.05).unwrap();
        let svg = station_timeseries("Sylhet", &years, &rain, Some(&mk), &SeriesStyle::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Sylhet: annual rainfall"));
        assert!(svg.contains("MK: increasing"));
    }

    #[test]
    fn annual_plot_rejects_bad_input() {
        let style = SeriesStyle::default();
        assert!(matches!(
            station_timeseries("A", &[2000, 2001], &[1.0], None, &style),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(station_timeseries("A", &[2000], &[f64::NAN], None, &style).is_err());
    }

    #[test]
    fn monthly_plot_svg() {
        let series: Vec<(NaiveDate, f64)> = (0..36)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2000 + i / 12, (i % 12) as u32 + 1, 1).unwrap();
                let value = if i == 10 { f64::NAN } else { 100.0 + f64::from(i) };
                (date, value)
            })
            .collect();
        let svg = monthly_timeseries("Rangpur", &series, &SeriesStyle::default()).unwrap();
        assert!(svg.contains("Rangpur: monthly rainfall"));
        assert!(svg.contains("12-month rolling mean"));
        assert!(monthly_timeseries("Rangpur", &[], &SeriesStyle::default()).is_err());
    }
}
