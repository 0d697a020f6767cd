//! Rainfall statistics for station time series
//!
//! - **aggregate**: daily observations to monthly, annual and seasonal totals
//! - **season**: the four climatological seasons
//! - **trend**: Mann-Kendall, Sen's slope and linear regression, per station

pub mod aggregate;
pub mod season;
pub mod trend;

pub use aggregate::{
    annual_totals, clean_daily, monthly_series, monthly_totals, rolling_mean, seasonal_totals,
    SeasonalTotal,
};
pub use season::Season;
pub use trend::{
    linear_regression, mann_kendall, seasonal_trends, sens_slope, station_trends,
    LinearRegression, MannKendall, SeasonalTrend, StationTrend, Trend, TrendParams,
    MIN_SERIES_LENGTH,
};
