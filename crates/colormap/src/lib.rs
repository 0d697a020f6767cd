//! # raintrend colormap
//!
//! Color mapping for trend and rainfall maps.
//!
//! Provides four color schemes on top of a generic multi-stop
//! interpolation engine. [`ColormapParams::color`] maps single values
//! (station markers, legend swatches); [`field_to_rgba`] converts a whole
//! interpolated `Raster<f64>` into an RGBA buffer.
//!
//! ## Usage
//!
//! ```ignore
//! use raintrend_colormap::{ColorScheme, ColormapParams, field_to_rgba};
//!
//! let params = ColormapParams::symmetric(ColorScheme::RdBuR, slopes.iter().copied());
//! let rgba = field_to_rgba(&raster, &params);
//! ```

mod render;
mod scheme;

pub use render::{auto_params, field_to_rgba, symmetric_range, ColormapParams};
pub use scheme::{evaluate, ColorScheme, ColorStop, Rgb};
