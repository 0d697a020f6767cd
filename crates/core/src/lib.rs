//! # raintrend core
//!
//! Shared types and I/O for the rainfall trend workflow.
//!
//! This crate provides:
//! - `Raster<T>`: north-up grid used to export interpolated fields
//! - `GeoTransform`: affine georeferencing for rasters
//! - `CRS`, `Projection`, `Transformer`: WGS84 <-> planar reprojection
//! - `BoundaryRegion`: polygon mask for interpolated grids
//! - I/O for station CSV tables, GeoJSON boundaries and GeoTIFF export

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod records;
pub mod vector;

pub use crs::{Projection, Transformer, CRS};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::BoundaryRegion;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Projection, Transformer, CRS};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::BoundaryRegion;
}
