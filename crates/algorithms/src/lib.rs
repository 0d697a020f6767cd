//! # raintrend algorithms
//!
//! - **interpolation**: chunked inverse distance weighting of station
//!   values onto a regular grid, polygon masking, and the full
//!   project -> interpolate -> mask -> unproject trend surface pipeline
//! - **statistics**: daily -> monthly / annual / seasonal rainfall
//!   aggregation and trend tests (Mann-Kendall, Sen's slope, OLS)

pub mod interpolation;
mod maybe_rayon;
pub mod statistics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        apply_mask, idw, interpolate, masked_idw, trend_surface, CellStatus, IdwParams,
        MaskedField, QueryGrid, SamplePoint, SurfaceParams, TrendSurface,
    };
    pub use crate::statistics::{
        annual_totals, clean_daily, linear_regression, mann_kendall, monthly_totals,
        seasonal_totals, seasonal_trends, sens_slope, station_trends, MannKendall, Season,
        SeasonalTotal, SeasonalTrend, StationTrend, Trend, TrendParams,
    };
    pub use raintrend_core::prelude::*;
}
