//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates values at query points as a weighted average of source
//! points, with weights inversely proportional to distance raised to a
//! power parameter:
//!
//! ```text
//! z(q) = Σ(wi * zi) / Σ(wi)
//! where wi = 1 / (d(q, si)^p + ε)
//! ```
//!
//! Query points are processed in chunks so the transient distance matrix
//! never exceeds `chunk_size × N` entries. Each query point's estimate only
//! depends on its own row of the matrix, so the chunk size never changes
//! the result.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use ndarray::{Array2, ArrayView1};
use raintrend_core::{Error, Result};

use super::{QueryGrid, SamplePoint};
use crate::maybe_rayon::*;

/// Distance below which a query point takes the coincident source's value.
pub const EXACT_MATCH_TOLERANCE: f64 = 1e-6;

/// Parameters for IDW interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct IdwParams {
    /// Power parameter (default: 2.0). Must be positive.
    /// Higher values concentrate influence near the closest sources.
    pub power: f64,
    /// Search radius in coordinate units. Sources farther than this do not
    /// contribute; a source exactly at the radius does.
    /// `None` means every source contributes to every query point.
    pub radius: Option<f64>,
    /// Number of query points per batch (default: 20000).
    pub chunk_size: usize,
    /// Added to `d^p` in the weight denominator (default: 1e-12).
    pub epsilon: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            radius: None,
            chunk_size: 20_000,
            epsilon: 1e-12,
        }
    }
}

impl IdwParams {
    fn validate(&self) -> Result<()> {
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(Error::invalid("power", self.power, "must be a positive finite number"));
        }
        if let Some(radius) = self.radius {
            if !(radius >= 0.0) {
                return Err(Error::invalid("radius", radius, "must be zero or positive"));
            }
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid("chunk_size", 0, "must be at least 1"));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(Error::invalid("epsilon", self.epsilon, "must be a small non-negative number"));
        }
        Ok(())
    }
}

/// Interpolate source values onto query points.
///
/// # Arguments
/// * `grid_points` - Query points (x, y), in output order
/// * `source_points` - Source coordinates (x, y)
/// * `source_values` - One finite value per source point
/// * `params` - Power, search radius, chunk size and epsilon
///
/// # Returns
/// One value per query point. A query point within
/// [`EXACT_MATCH_TOLERANCE`] of a source takes that source's value (the
/// first such source in input order). A query point with no source inside
/// the search radius is NaN.
///
/// # Errors
/// [`Error::NoSourcePoints`] for an empty source set,
/// [`Error::LengthMismatch`] when coordinates and values differ in length,
/// [`Error::InvalidParameter`] for a non-positive power, negative radius,
/// zero chunk size, or non-finite source data.
pub fn interpolate(
    grid_points: &[(f64, f64)],
    source_points: &[(f64, f64)],
    source_values: &[f64],
    params: &IdwParams,
) -> Result<Vec<f64>> {
    if source_points.is_empty() {
        return Err(Error::NoSourcePoints);
    }
    if source_points.len() != source_values.len() {
        return Err(Error::LengthMismatch {
            points: source_points.len(),
            values: source_values.len(),
        });
    }
    params.validate()?;

    if let Some(i) = source_values.iter().position(|v| !v.is_finite()) {
        return Err(Error::invalid(
            "source_values",
            source_values[i],
            format!("source {i} has a non-finite value"),
        ));
    }
    if let Some(i) = source_points
        .iter()
        .position(|(x, y)| !(x.is_finite() && y.is_finite()))
    {
        return Err(Error::invalid(
            "source_points",
            format!("{:?}", source_points[i]),
            format!("source {i} has a non-finite coordinate"),
        ));
    }

    let total = grid_points.len();
    let chunk_size = params.chunk_size;
    let n_chunks = total.div_ceil(chunk_size);

    let field: Vec<f64> = (0..n_chunks)
        .into_par_iter()
        .flat_map(|chunk| {
            let start = chunk * chunk_size;
            let end = (start + chunk_size).min(total);
            interpolate_chunk(&grid_points[start..end], source_points, source_values, params)
        })
        .collect();

    debug_assert_eq!(field.len(), total);
    Ok(field)
}

/// IDW over a regular query grid from sample points.
pub fn idw(points: &[SamplePoint], grid: &QueryGrid, params: &IdwParams) -> Result<Vec<f64>> {
    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    interpolate(&grid.points(), &coords, &values, params)
}

/// Estimates for one chunk of query points.
fn interpolate_chunk(
    queries: &[(f64, f64)],
    sources: &[(f64, f64)],
    values: &[f64],
    params: &IdwParams,
) -> Vec<f64> {
    // chunk × N distance matrix, dropped when the chunk is done
    let distances = Array2::from_shape_fn((queries.len(), sources.len()), |(i, j)| {
        let (qx, qy) = queries[i];
        let (sx, sy) = sources[j];
        (qx - sx).hypot(qy - sy)
    });

    distances
        .outer_iter()
        .map(|row| estimate(row, values, params))
        .collect()
}

fn estimate(distances: ArrayView1<'_, f64>, values: &[f64], params: &IdwParams) -> f64 {
    if let Some(j) = distances.iter().position(|&d| d < EXACT_MATCH_TOLERANCE) {
        return values[j];
    }

    let mut sum_w = 0.0;
    let mut sum_wz = 0.0;

    for (&d, &value) in distances.iter().zip(values) {
        if let Some(radius) = params.radius {
            if d > radius {
                continue;
            }
        }
        let w = 1.0 / (d.powf(params.power) + params.epsilon);
        sum_w += w;
        sum_wz += w * value;
    }

    if sum_w > 0.0 {
        sum_wz / sum_w
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> (Vec<(f64, f64)>, Vec<f64>) {
        (
            vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)],
            vec![10.0, 20.0, 30.0],
        )
    }

    fn lattice(n: usize, step: f64) -> Vec<(f64, f64)> {
        (0..n)
            .flat_map(|row| (0..n).map(move |col| (col as f64 * step, row as f64 * step)))
            .collect()
    }

    #[test]
    fn test_idw_worked_example() {
        let (points, values) = triangle();
        let z = interpolate(&[(5.0, 0.0)], &points, &values, &IdwParams::default()).unwrap();

        // w1 = w2 = 1/25, w3 = 1/125
        let w = [1.0 / (25.0 + 1e-12), 1.0 / (25.0 + 1e-12), 1.0 / (125.0 + 1e-12)];
        let expected = (w[0] * 10.0 + w[1] * 20.0 + w[2] * 30.0) / (w[0] + w[1] + w[2]);
        assert_relative_eq!(z[0], expected, max_relative = 1e-12);
        assert_relative_eq!(z[0], 180.0 / 11.0, max_relative = 1e-9);
        assert!(z[0] > 15.0 && z[0] < 20.0);
    }

    #[test]
    fn test_idw_exact_match() {
        let (points, values) = triangle();
        for power in [0.5, 1.0, 2.0, 5.0] {
            for radius in [None, Some(0.0), Some(3.0), Some(1e6)] {
                let params = IdwParams { power, radius, ..Default::default() };
                let z = interpolate(&points, &points, &values, &params).unwrap();
                assert_eq!(z, values, "power={power} radius={radius:?}");
            }
        }
    }

    #[test]
    fn test_idw_exact_match_first_source_wins() {
        let points = vec![(1.0, 1.0), (1.0, 1.0 + 1e-9), (50.0, 50.0)];
        let values = vec![7.0, 99.0, -3.0];
        let z = interpolate(&[(1.0, 1.0)], &points, &values, &IdwParams::default()).unwrap();
        assert_eq!(z[0], 7.0);
    }

    #[test]
    fn test_idw_chunk_invariance() {
        let grid = lattice(23, 0.7);
        let points = vec![(1.0, 2.0), (13.0, 4.5), (7.5, 15.0), (3.3, 9.9), (14.0, 14.0)];
        let values = vec![-4.0, 12.0, 3.5, 0.25, 8.0];

        let single = IdwParams { chunk_size: grid.len(), radius: Some(6.0), ..Default::default() };
        let reference = interpolate(&grid, &points, &values, &single).unwrap();

        for chunk_size in [1, 2, 7, 100, grid.len() + 5] {
            let params = IdwParams { chunk_size, ..single.clone() };
            let z = interpolate(&grid, &points, &values, &params).unwrap();
            assert_eq!(z.len(), reference.len());
            for (a, b) in z.iter().zip(&reference) {
                assert!(
                    (a.is_nan() && b.is_nan()) || a == b,
                    "chunk_size={chunk_size}: {a} != {b}"
                );
            }
        }
    }

    #[test]
    fn test_idw_radius_exclusion() {
        let (points, values) = triangle();
        let params = IdwParams { radius: Some(2.0), ..Default::default() };
        let z = interpolate(&[(5.0, 5.0), (1.0, 0.0)], &points, &values, &params).unwrap();
        assert!(z[0].is_nan(), "no source within radius");
        assert_relative_eq!(z[1], 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_idw_radius_is_inclusive() {
        let points = vec![(0.0, 0.0), (10.0, 0.0)];
        let values = vec![1.0, 5.0];
        let params = IdwParams { radius: Some(4.0), ..Default::default() };
        let z = interpolate(&[(4.0, 0.0)], &points, &values, &params).unwrap();
        assert_relative_eq!(z[0], 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_idw_between_two_sources_stays_in_range() {
        let points = vec![(0.0, 0.0), (10.0, 10.0)];
        let values = vec![-2.0, 6.0];
        for t in [0.01, 0.2, 0.5, 0.8, 0.99] {
            let q = (10.0 * t, 10.0 * t);
            for power in [1.0, 2.0, 3.0] {
                let params = IdwParams { power, ..Default::default() };
                let z = interpolate(&[q], &points, &values, &params).unwrap()[0];
                assert!((-2.0..=6.0).contains(&z), "t={t} power={power} z={z}");
            }
        }
    }

    #[test]
    fn test_idw_power_sharpens_locality() {
        let (points, values) = triangle();
        let q = [(1.0, 1.0)];
        let low = interpolate(&q, &points, &values, &IdwParams { power: 1.0, ..Default::default() })
            .unwrap()[0];
        let high = interpolate(&q, &points, &values, &IdwParams { power: 4.0, ..Default::default() })
            .unwrap()[0];
        assert!((high - 10.0).abs() < (low - 10.0).abs());
    }

    #[test]
    fn test_idw_configuration_errors() {
        let (points, values) = triangle();
        let q = [(1.0, 1.0)];

        assert!(matches!(
            interpolate(&q, &[], &[], &IdwParams::default()),
            Err(Error::NoSourcePoints)
        ));
        assert!(matches!(
            interpolate(&q, &points, &values[..2], &IdwParams::default()),
            Err(Error::LengthMismatch { points: 3, values: 2 })
        ));
        for power in [0.0, -1.0, f64::NAN] {
            let params = IdwParams { power, ..Default::default() };
            assert!(matches!(
                interpolate(&q, &points, &values, &params),
                Err(Error::InvalidParameter { name: "power", .. })
            ));
        }
        let params = IdwParams { chunk_size: 0, ..Default::default() };
        assert!(matches!(
            interpolate(&q, &points, &values, &params),
            Err(Error::InvalidParameter { name: "chunk_size", .. })
        ));
        let params = IdwParams { radius: Some(-1.0), ..Default::default() };
        assert!(matches!(
            interpolate(&q, &points, &values, &params),
            Err(Error::InvalidParameter { name: "radius", .. })
        ));
        assert!(matches!(
            interpolate(&q, &points, &[1.0, f64::NAN, 2.0], &IdwParams::default()),
            Err(Error::InvalidParameter { name: "source_values", .. })
        ));
    }

    #[test]
    fn test_idw_empty_grid_is_fine() {
        let (points, values) = triangle();
        let z = interpolate(&[], &points, &values, &IdwParams::default()).unwrap();
        assert!(z.is_empty());
    }

    #[test]
    fn test_idw_single_point_everywhere() {
        let points = vec![SamplePoint::new(5.0, 5.0, 42.0)];
        let grid = QueryGrid::new((0.0, 0.0, 10.0, 10.0), 4, 3).unwrap();
        let z = idw(&points, &grid, &IdwParams::default()).unwrap();
        assert_eq!(z.len(), 12);
        for v in z {
            assert_relative_eq!(v, 42.0, max_relative = 1e-12);
        }
    }
}
