//! Spatial interpolation of station values
//!
//! - IDW: chunked inverse distance weighting with exact-match and
//!   search-radius handling
//! - QueryGrid: regular lattice of query points in planar coordinates
//! - Masking: blank out grid cells outside a boundary region
//! - Surface: the end-to-end trend surface pipeline

mod grid;
mod idw;
mod mask;
mod surface;

pub use grid::QueryGrid;
pub use idw::{idw, interpolate, IdwParams, EXACT_MATCH_TOLERANCE};
pub use mask::{apply_mask, masked_idw, CellStatus, MaskedField};
pub use surface::{trend_surface, GridSample, SurfaceParams, TrendSurface};

/// A source point with planar x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Euclidean distance to (x, y)
    #[inline]
    pub fn dist(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}
