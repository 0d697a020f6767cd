//! Cell value trait for rasters

use num_traits::{Float, NumCast};
use std::fmt::Debug;

/// Floating point types that can be stored in a raster cell.
///
/// Interpolated fields use NaN as the "undefined" marker, so only float
/// cell types are supported.
pub trait RasterElement: Float + Debug + Send + Sync + 'static {
    /// Value written for undefined cells
    fn nodata() -> Self {
        Self::nan()
    }

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        if self.is_nan() {
            return true;
        }
        match nodata {
            Some(nd) => {
                let tol = Self::epsilon() * <Self as NumCast>::from(100.0).unwrap_or_else(Self::one);
                (*self - nd).abs() <= tol
            }
            None => false,
        }
    }
}

impl RasterElement for f32 {}
impl RasterElement for f64 {}
