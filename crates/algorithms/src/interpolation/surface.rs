//! Trend surface: station values -> masked planar grid -> lon/lat samples
//!
//! Stations and the boundary arrive in WGS84. Both are projected to a
//! planar CRS so that distances (and the search radius) are in metres,
//! the grid is laid over the projected boundary's bounding box, and the
//! masked field is carried back to lon/lat for mapping.

use raintrend_core::records::StationPoint;
use raintrend_core::{BoundaryRegion, Error, Raster, Result, Transformer, CRS};
use serde::Serialize;
use tracing::debug;

use super::{masked_idw, CellStatus, IdwParams, MaskedField, QueryGrid, SamplePoint};

/// Parameters for [`trend_surface`]
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceParams {
    /// Planar CRS used for distances (default: EPSG:3857)
    pub planar_crs: CRS,
    /// Target grid spacing in planar units (default: 3000 m)
    pub grid_spacing: f64,
    /// IDW settings (default: power 2, radius 150 km)
    pub idw: IdwParams,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            planar_crs: CRS::web_mercator(),
            grid_spacing: 3000.0,
            idw: IdwParams {
                radius: Some(150_000.0),
                ..Default::default()
            },
        }
    }
}

/// One grid point of a trend surface, as written to the grid CSV
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSample {
    pub lon: f64,
    pub lat: f64,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// A masked, interpolated trend field
#[derive(Debug, Clone)]
pub struct TrendSurface {
    pub field: MaskedField,
    pub crs: CRS,
    /// Lon/lat of every grid point, in grid order
    pub lonlat: Vec<(f64, f64)>,
}

impl TrendSurface {
    pub fn grid(&self) -> &QueryGrid {
        &self.field.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.field.values
    }

    /// North-up raster in the planar CRS
    pub fn to_raster(&self) -> Result<Raster<f64>> {
        let mut raster = self.field.grid.to_raster(&self.field.values)?;
        raster.set_crs(Some(self.crs));
        Ok(raster)
    }

    /// Every grid point with a defined value
    pub fn samples(&self) -> Vec<GridSample> {
        let points = self.field.grid.points();
        points
            .iter()
            .zip(&self.lonlat)
            .zip(self.field.values.iter().zip(&self.field.status))
            .filter(|(_, (_, &status))| status == CellStatus::Estimate)
            .map(|((&(x, y), &(lon, lat)), (&value, _))| GridSample { lon, lat, x, y, value })
            .collect()
    }
}

/// Interpolate station values over a boundary region.
///
/// `stations` and `boundary` are in WGS84 longitude/latitude.
pub fn trend_surface(
    stations: &[StationPoint],
    boundary: &BoundaryRegion,
    params: &SurfaceParams,
) -> Result<TrendSurface> {
    if stations.is_empty() {
        return Err(Error::NoSourcePoints);
    }
    let to_planar = Transformer::new(CRS::wgs84(), params.planar_crs)?;
    let to_geographic = to_planar.inverse();

    let sources: Vec<SamplePoint> = stations
        .iter()
        .map(|s| {
            let (x, y) = to_planar.transform(s.longitude, s.latitude);
            SamplePoint::new(x, y, s.value)
        })
        .collect();

    let region = boundary.transform(&to_planar);
    let grid = QueryGrid::from_bounds(region.bounds()?, params.grid_spacing)?;
    debug!(
        stations = sources.len(),
        nx = grid.nx,
        ny = grid.ny,
        crs = %params.planar_crs,
        "interpolating trend surface"
    );

    let field = masked_idw(&grid, &sources, &region, &params.idw)?;
    debug!(
        estimates = field.count(CellStatus::Estimate),
        no_data = field.count(CellStatus::NoData),
        outside = field.count(CellStatus::OutsideRegion),
        "masked grid"
    );

    let lonlat = to_geographic.transform_points(&grid.points());

    Ok(TrendSurface {
        field,
        crs: params.planar_crs,
        lonlat,
    })
}
