//! Regular query lattice covering a bounding box

use ndarray::Array2;
use raintrend_core::{Error, GeoTransform, Raster, Result};

/// A regular lattice of query points.
///
/// Points are ordered row-major: row index follows y ascending from
/// `min_y`, column index follows x ascending from `min_x`. Both axes
/// include their end points, so the last column sits exactly on `max_x`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGrid {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub nx: usize,
    pub ny: usize,
}

impl QueryGrid {
    /// Lattice over `(min_x, min_y, max_x, max_y)` with `nx × ny` points.
    pub fn new(bounds: (f64, f64, f64, f64), nx: usize, ny: usize) -> Result<Self> {
        let (min_x, min_y, max_x, max_y) = bounds;
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(Error::invalid("bounds", format!("{bounds:?}"), "must be finite"));
        }
        if !(max_x > min_x && max_y > min_y) {
            return Err(Error::invalid("bounds", format!("{bounds:?}"), "extent is degenerate"));
        }
        if nx < 2 || ny < 2 {
            return Err(Error::InvalidDimensions { width: nx, height: ny });
        }
        Ok(Self { min_x, min_y, max_x, max_y, nx, ny })
    }

    /// Lattice with roughly `spacing` between points.
    ///
    /// Each axis gets `ceil(extent / spacing) + 1` points spread evenly
    /// from min to max, so the effective spacing is never larger than the
    /// requested one.
    pub fn from_bounds(bounds: (f64, f64, f64, f64), spacing: f64) -> Result<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(Error::invalid("spacing", spacing, "must be positive"));
        }
        let (min_x, min_y, max_x, max_y) = bounds;
        let count = |extent: f64| -> usize {
            if extent.is_finite() && extent > 0.0 {
                (extent / spacing).ceil() as usize + 1
            } else {
                0
            }
        };
        Self::new(bounds, count(max_x - min_x), count(max_y - min_y))
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (rows, cols) = (ny, nx)
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    pub fn dx(&self) -> f64 {
        (self.max_x - self.min_x) / (self.nx - 1) as f64
    }

    pub fn dy(&self) -> f64 {
        (self.max_y - self.min_y) / (self.ny - 1) as f64
    }

    pub fn x_coords(&self) -> Vec<f64> {
        linspace(self.min_x, self.max_x, self.nx)
    }

    pub fn y_coords(&self) -> Vec<f64> {
        linspace(self.min_y, self.max_y, self.ny)
    }

    /// Coordinates of the `index`-th point in row-major order
    pub fn point(&self, index: usize) -> (f64, f64) {
        let (row, col) = (index / self.nx, index % self.nx);
        (
            axis_value(self.min_x, self.max_x, self.nx, col),
            axis_value(self.min_y, self.max_y, self.ny, row),
        )
    }

    /// All points in row-major order
    pub fn points(&self) -> Vec<(f64, f64)> {
        let xs = self.x_coords();
        let ys = self.y_coords();
        ys.iter()
            .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
            .collect()
    }

    /// Reshape a flat row-major field to `(ny, nx)`; row 0 is `min_y`.
    pub fn reshape(&self, values: &[f64]) -> Result<Array2<f64>> {
        if values.len() != self.len() {
            return Err(Error::LengthMismatch { points: self.len(), values: values.len() });
        }
        Array2::from_shape_vec(self.shape(), values.to_vec())
            .map_err(|e| Error::Other(e.to_string()))
    }

    /// Build a north-up raster whose cell centers are the lattice points.
    ///
    /// Rows are flipped so that raster row 0 is `max_y`.
    pub fn to_raster(&self, values: &[f64]) -> Result<Raster<f64>> {
        let mut field = self.reshape(values)?;
        field.invert_axis(ndarray::Axis(0));
        let mut raster = Raster::from_array(field.as_standard_layout().into_owned());
        raster.set_transform(GeoTransform::from_lattice(
            self.min_x,
            self.max_y,
            self.dx(),
            self.dy(),
        ));
        Ok(raster)
    }
}

fn axis_value(min: f64, max: f64, n: usize, i: usize) -> f64 {
    if i + 1 == n {
        max
    } else {
        min + (max - min) * i as f64 / (n - 1) as f64
    }
}

fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| axis_value(min, max, n, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_from_bounds() {
        let grid = QueryGrid::from_bounds((0.0, 0.0, 10.0, 4.0), 3.0).unwrap();
        assert_eq!(grid.nx, 5); // ceil(10/3) + 1
        assert_eq!(grid.ny, 3); // ceil(4/3) + 1
        assert_eq!(grid.len(), 15);
        assert_relative_eq!(grid.dx(), 2.5);
        assert_relative_eq!(grid.dy(), 2.0);
        assert_eq!(*grid.x_coords().last().unwrap(), 10.0);
    }

    #[test]
    fn test_grid_row_major_order() {
        let grid = QueryGrid::new((0.0, 0.0, 2.0, 1.0), 3, 2).unwrap();
        let points = grid.points();
        assert_eq!(
            points,
            vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]
        );
        for (i, p) in points.iter().enumerate() {
            assert_eq!(grid.point(i), *p);
        }
    }

    #[test]
    fn test_grid_degenerate() {
        assert!(QueryGrid::from_bounds((0.0, 0.0, 0.0, 5.0), 1.0).is_err());
        assert!(QueryGrid::from_bounds((0.0, 0.0, 5.0, 5.0), 0.0).is_err());
        assert!(QueryGrid::new((0.0, 0.0, 5.0, 5.0), 1, 4).is_err());
        assert!(QueryGrid::new((0.0, f64::NAN, 5.0, 5.0), 3, 3).is_err());
    }

    #[test]
    fn test_grid_to_raster_is_north_up() {
        let grid = QueryGrid::new((0.0, 0.0, 2.0, 1.0), 3, 2).unwrap();
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let raster = grid.to_raster(&values).unwrap();
        assert_eq!(raster.shape(), (2, 3));
        // Top row holds the max_y points
        assert_eq!(raster.get(0, 0).unwrap(), 4.0);
        assert_eq!(raster.get(1, 2).unwrap(), 3.0);
        let (x, y) = raster.pixel_to_geo(0, 0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 1.0);

        assert!(grid.to_raster(&values[..5]).is_err());
    }
}
