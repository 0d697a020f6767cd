//! SVG plots for rainfall trend analysis
//!
//! Every plot is rendered to an SVG string with plotters; callers decide
//! where it is written.
//!
//! - [`station_trend_map`]: stations coloured by trend, significant ones ringed
//! - [`interpolated_map`]: a masked IDW surface with the boundary and stations
//! - [`station_timeseries`] / [`monthly_timeseries`]: per-station series

mod map;
mod style;
mod timeseries;

pub use map::{interpolated_map, station_trend_map};
pub use style::{MapStyle, SeriesStyle};
pub use timeseries::{monthly_timeseries, station_timeseries};
