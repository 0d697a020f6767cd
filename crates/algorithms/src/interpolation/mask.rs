//! Masking interpolated fields to a boundary region

use raintrend_core::{BoundaryRegion, Error, Result};
use serde::Serialize;

use super::{interpolate, IdwParams, QueryGrid, SamplePoint};
use crate::maybe_rayon::*;

/// Why a grid cell holds the value it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CellStatus {
    /// Inside the region with at least one source within the radius
    Estimate,
    /// Inside the region but no source within the radius
    NoData,
    /// Outside the region (or on its outer boundary)
    OutsideRegion,
}

/// Strict-interior membership of every point, in parallel
fn inside_region(points: &[(f64, f64)], region: &BoundaryRegion) -> Vec<bool> {
    (0..points.len())
        .into_par_iter()
        .map(|i| region.contains(points[i].0, points[i].1))
        .collect()
}

/// Set every value whose point is not strictly inside `region` to NaN.
///
/// Returns a new vector; `field` is left untouched. Values of points
/// inside the region are copied unchanged, including NaN.
pub fn apply_mask(
    points: &[(f64, f64)],
    field: &[f64],
    region: &BoundaryRegion,
) -> Result<Vec<f64>> {
    if points.len() != field.len() {
        return Err(Error::LengthMismatch {
            points: points.len(),
            values: field.len(),
        });
    }

    Ok(inside_region(points, region)
        .into_iter()
        .zip(field)
        .map(|(inside, &z)| if inside { z } else { f64::NAN })
        .collect())
}

/// An interpolated, masked field with per-cell status.
///
/// `values[i]` is NaN exactly when `status[i]` is not
/// [`CellStatus::Estimate`].
#[derive(Debug, Clone)]
pub struct MaskedField {
    pub grid: QueryGrid,
    pub values: Vec<f64>,
    pub status: Vec<CellStatus>,
}

impl MaskedField {
    pub fn count(&self, status: CellStatus) -> usize {
        self.status.iter().filter(|&&s| s == status).count()
    }

    /// Range of the defined values, if any
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Interpolate `sources` onto `grid` and mask the result to `region`.
pub fn masked_idw(
    grid: &QueryGrid,
    sources: &[SamplePoint],
    region: &BoundaryRegion,
    params: &IdwParams,
) -> Result<MaskedField> {
    let points = grid.points();
    let coords: Vec<(f64, f64)> = sources.iter().map(|p| (p.x, p.y)).collect();
    let values: Vec<f64> = sources.iter().map(|p| p.value).collect();

    let field = interpolate(&points, &coords, &values, params)?;

    let (values, status): (Vec<f64>, Vec<CellStatus>) = inside_region(&points, region)
        .into_iter()
        .zip(field)
        .map(|(inside, z)| {
            if !inside {
                (f64::NAN, CellStatus::OutsideRegion)
            } else if z.is_nan() {
                (f64::NAN, CellStatus::NoData)
            } else {
                (z, CellStatus::Estimate)
            }
        })
        .unzip();

    Ok(MaskedField {
        grid: grid.clone(),
        values,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_mask_outside_and_boundary() {
        let region = BoundaryRegion::from_polygon(square(0.0, 0.0, 10.0));
        let points = vec![(5.0, 5.0), (10.0, 5.0), (15.0, 5.0), (1.0, 9.0)];
        let field = vec![1.0, 2.0, 3.0, f64::NAN];

        let masked = apply_mask(&points, &field, &region).unwrap();
        assert_eq!(masked[0], 1.0);
        assert!(masked[1].is_nan(), "outer boundary is outside");
        assert!(masked[2].is_nan());
        assert!(masked[3].is_nan(), "inside NaN stays NaN");
        assert_eq!(field[1], 2.0, "input is not modified");
    }

    #[test]
    fn test_mask_shared_edge() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 10.0),
            square(10.0, 0.0, 10.0),
        ]))
        .unwrap();
        let masked = apply_mask(&[(10.0, 5.0)], &[4.0], &region).unwrap();
        assert_eq!(masked[0], 4.0);
    }

    #[test]
    fn test_mask_paths_agree_on_two_part_region() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 10.0),
            square(10.0, 0.0, 10.0),
        ]))
        .unwrap();
        // Lattice nodes land on the ends of the shared edge at (10, 0) and (10, 10)
        let grid = QueryGrid::new((0.0, 0.0, 20.0, 10.0), 5, 3).unwrap();
        let sources = vec![SamplePoint::new(5.0, 5.0, 1.0), SamplePoint::new(15.0, 5.0, 3.0)];
        let params = IdwParams::default();

        let result = masked_idw(&grid, &sources, &region, &params).unwrap();
        let points = grid.points();
        let raw = interpolate(&points, &[(5.0, 5.0), (15.0, 5.0)], &[1.0, 3.0], &params).unwrap();
        let masked = apply_mask(&points, &raw, &region).unwrap();

        for (i, &(x, y)) in points.iter().enumerate() {
            let inside = result.status[i] != CellStatus::OutsideRegion;
            assert_eq!(inside, !masked[i].is_nan(), "cell ({x}, {y})");
        }
        let estimates: Vec<(f64, f64)> = points
            .iter()
            .zip(&result.status)
            .filter(|(_, &s)| s == CellStatus::Estimate)
            .map(|(&p, _)| p)
            .collect();
        assert_eq!(estimates, vec![(5.0, 5.0), (10.0, 5.0), (15.0, 5.0)]);
    }

    #[test]
    fn test_mask_length_mismatch() {
        let region = BoundaryRegion::from_polygon(square(0.0, 0.0, 10.0));
        assert!(matches!(
            apply_mask(&[(1.0, 1.0)], &[1.0, 2.0], &region),
            Err(Error::LengthMismatch { points: 1, values: 2 })
        ));
    }

    #[test]
    fn test_masked_idw_status() {
        let region = BoundaryRegion::from_polygon(square(0.0, 0.0, 100.0));
        let grid = QueryGrid::new((-10.0, -10.0, 110.0, 110.0), 13, 13).unwrap();
        let sources = vec![SamplePoint::new(10.0, 10.0, 5.0)];
        let params = IdwParams {
            radius: Some(30.0),
            ..Default::default()
        };

        let result = masked_idw(&grid, &sources, &region, &params).unwrap();
        assert_eq!(result.values.len(), grid.len());

        for (i, (&value, &status)) in result.values.iter().zip(&result.status).enumerate() {
            let (x, y) = grid.point(i);
            match status {
                CellStatus::Estimate => {
                    assert_relative_eq!(value, 5.0, max_relative = 1e-12);
                    assert!(sources[0].dist(x, y) <= 30.0);
                }
                CellStatus::NoData => {
                    assert!(value.is_nan());
                    assert!(region.contains(x, y));
                }
                CellStatus::OutsideRegion => {
                    assert!(value.is_nan());
                    assert!(!region.contains(x, y));
                }
            }
        }
        assert!(result.count(CellStatus::Estimate) > 0);
        assert!(result.count(CellStatus::NoData) > 0);
        assert!(result.count(CellStatus::OutsideRegion) > 0);
        let (lo, hi) = result.value_range().unwrap();
        assert_relative_eq!(lo, 5.0, max_relative = 1e-12);
        assert_relative_eq!(hi, 5.0, max_relative = 1e-12);
    }
}
