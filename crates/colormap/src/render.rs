//! Field-to-RGBA rendering using color schemes.

use crate::scheme::{evaluate, ColorScheme, Rgb};
use raintrend_core::raster::{Raster, RasterElement};

/// Parameters for colormap rendering.
#[derive(Debug, Clone)]
pub struct ColormapParams {
    /// Color scheme to use.
    pub scheme: ColorScheme,
    /// Minimum value for normalization. Values below this are clamped.
    pub min: f64,
    /// Maximum value for normalization. Values above this are clamped.
    pub max: f64,
    /// Color for undefined cells (RGBA). Default: fully transparent.
    pub nodata_color: [u8; 4],
    /// Quantize into this many equal bands (filled-contour look).
    /// `None` gives a continuous ramp.
    pub levels: Option<usize>,
}

impl ColormapParams {
    pub fn new(scheme: ColorScheme) -> Self {
        Self::with_range(scheme, 0.0, 1.0)
    }

    /// Create params with explicit min/max range.
    pub fn with_range(scheme: ColorScheme, min: f64, max: f64) -> Self {
        Self {
            scheme,
            min,
            max,
            nodata_color: [0, 0, 0, 0],
            levels: None,
        }
    }

    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = (levels > 0).then_some(levels);
        self
    }

    /// Range centered on zero that covers every finite value
    pub fn symmetric<I>(scheme: ColorScheme, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = symmetric_range(values);
        Self::with_range(scheme, min, max)
    }

    /// Position of `value` in the range, unclamped
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range.abs() > f64::EPSILON {
            (value - self.min) / range
        } else {
            0.5
        }
    }

    /// Color of a value, or `None` when the value is not finite
    pub fn color(&self, value: f64) -> Option<Rgb> {
        if !value.is_finite() {
            return None;
        }
        let mut t = self.normalize(value).clamp(0.0, 1.0);
        if let Some(n) = self.levels {
            let n = n as f64;
            t = ((t * n).floor().min(n - 1.0) + 0.5) / n;
        }
        Some(evaluate(self.scheme, t))
    }
}

/// `(-vmax, vmax)` with `vmax` the largest absolute finite value.
///
/// Diverging trend maps use this so that zero change sits at the center
/// color. Falls back to `(-1, 1)` when no value is finite or all are zero.
pub fn symmetric_range<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let vmax = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if vmax > 0.0 {
        (-vmax, vmax)
    } else {
        (-1.0, 1.0)
    }
}

/// Auto-detect min/max from a field, returning `ColormapParams` ready to use.
///
/// Scans all valid (non-nodata) cells to find the data range.
pub fn auto_params(raster: &Raster<f64>, scheme: ColorScheme) -> ColormapParams {
    let stats = raster.statistics();
    let (mut min, mut max) = match (stats.min, stats.max) {
        (Some(min), Some(max)) => (min, max),
        _ => (0.0, 1.0),
    };
    if (max - min).abs() < f64::EPSILON {
        max = min + 1.0;
    }
    if !min.is_finite() || !max.is_finite() {
        min = 0.0;
        max = 1.0;
    }
    ColormapParams::with_range(scheme, min, max)
}

/// Convert a field to an RGBA pixel buffer.
///
/// Returns a `Vec<u8>` of length `rows * cols * 4` in row-major order.
/// Undefined cells are rendered with `params.nodata_color`.
pub fn field_to_rgba(raster: &Raster<f64>, params: &ColormapParams) -> Vec<u8> {
    let nodata = raster.nodata();
    let mut rgba = Vec::with_capacity(raster.len() * 4);

    for &val in raster.data().iter() {
        let color = if val.is_nodata(nodata) {
            None
        } else {
            params.color(val)
        };
        match color {
            Some(Rgb { r, g, b }) => rgba.extend_from_slice(&[r, g, b, 255]),
            None => rgba.extend_from_slice(&params.nodata_color),
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_to_rgba_basic() {
        let mut r = Raster::<f64>::new(2, 2);
        r.set(0, 0, 0.0).unwrap();
        r.set(0, 1, 0.5).unwrap();
        r.set(1, 0, 1.0).unwrap();
        r.set(1, 1, f64::NAN).unwrap();

        let params = ColormapParams::with_range(ColorScheme::Grayscale, 0.0, 1.0);
        let rgba = field_to_rgba(&r, &params);

        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[128, 128, 128, 255]);
        assert_eq!(&rgba[8..12], &[255, 255, 255, 255]);
        assert_eq!(&rgba[12..16], &[0, 0, 0, 0], "NaN is transparent");
    }

    #[test]
    fn symmetric_range_uses_largest_magnitude() {
        assert_eq!(symmetric_range([-3.0, 1.0, f64::NAN, 2.5]), (-3.0, 3.0));
        assert_eq!(symmetric_range([0.5, 7.0]), (-7.0, 7.0));
        assert_eq!(symmetric_range([0.0, 0.0]), (-1.0, 1.0));
        assert_eq!(symmetric_range(std::iter::empty()), (-1.0, 1.0));
    }

    #[test]
    fn zero_maps_to_center_color() {
        let params = ColormapParams::symmetric(ColorScheme::RdBuR, [-12.0, 4.0]);
        assert_eq!(params.color(0.0), Some(Rgb::new(247, 247, 247)));
        assert_eq!(params.color(f64::NAN), None);
        assert_eq!(params.color(-12.0), Some(Rgb::new(5, 48, 97)));
    }

    #[test]
    fn levels_band_the_ramp() {
        let params = ColormapParams::with_range(ColorScheme::Grayscale, 0.0, 1.0).with_levels(2);
        // Two bands with centers at 0.25 and 0.75
        assert_eq!(params.color(0.1), Some(Rgb::new(64, 64, 64)));
        assert_eq!(params.color(0.4), Some(Rgb::new(64, 64, 64)));
        assert_eq!(params.color(0.6), Some(Rgb::new(191, 191, 191)));
        assert_eq!(params.color(1.0), Some(Rgb::new(191, 191, 191)));
        assert_eq!(params.clone().with_levels(0).levels, None);
    }

    #[test]
    fn auto_params_range() {
        let r = Raster::from_vec(vec![10.0, 50.0, 100.0], 1, 3).unwrap();
        let params = auto_params(&r, ColorScheme::Rainfall);
        assert!((params.min - 10.0).abs() < f64::EPSILON);
        assert!((params.max - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn auto_params_all_nodata_and_constant() {
        let r = Raster::<f64>::new(1, 2);
        let params = auto_params(&r, ColorScheme::Rainfall);
        assert_eq!((params.min, params.max), (0.0, 1.0));

        let r = Raster::<f64>::filled(2, 2, 42.0);
        let params = auto_params(&r, ColorScheme::Rainfall);
        assert_eq!((params.min, params.max), (42.0, 43.0));
    }
}
