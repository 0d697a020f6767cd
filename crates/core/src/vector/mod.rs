//! Boundary region used to mask interpolated grids

use crate::crs::Transformer;
use crate::error::{Error, Result};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BooleanOps, BoundingRect, Coord, MapCoords, MultiPolygon, Polygon};

/// A closed planar region made of one or more polygons (holes allowed).
///
/// Containment is strict and is tested against the union of the parts: a
/// point on the outer boundary of the union is outside. Edges shared by two
/// parts (adjacent districts) are interior to the union and count as inside,
/// except at their endpoints on the outer boundary. Parts touching only at a
/// corner do not make that corner inside.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRegion {
    parts: MultiPolygon<f64>,
    dissolved: MultiPolygon<f64>,
}

/// Union of all parts, so shared edges disappear
fn dissolve(parts: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    match parts.0.as_slice() {
        [single] => MultiPolygon::new(vec![single.clone()]),
        _ => parts.iter().fold(MultiPolygon::new(Vec::new()), |acc, part| {
            acc.union(&MultiPolygon::new(vec![part.clone()]))
        }),
    }
}

impl BoundaryRegion {
    pub fn new(parts: MultiPolygon<f64>) -> Result<Self> {
        if parts.0.is_empty() {
            return Err(Error::EmptyGeometry);
        }
        let dissolved = dissolve(&parts);
        Ok(Self { parts, dissolved })
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        let parts = MultiPolygon::new(vec![polygon]);
        Self {
            dissolved: parts.clone(),
            parts,
        }
    }

    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.0.is_empty()
    }

    /// Bounding box (min_x, min_y, max_x, max_y) over all parts
    pub fn bounds(&self) -> Result<(f64, f64, f64, f64)> {
        let rect = self.parts.bounding_rect().ok_or(Error::EmptyGeometry)?;
        Ok((rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Whether (x, y) lies in the interior of the region
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.dissolved.coordinate_position(&Coord { x, y }) == CoordPos::Inside
    }

    /// Reproject every vertex
    pub fn transform(&self, transformer: &Transformer) -> Self {
        let project = |c: Coord<f64>| {
            let (x, y) = transformer.transform(c.x, c.y);
            Coord { x, y }
        };
        Self {
            parts: self.parts.map_coords(project),
            dissolved: self.dissolved.map_coords(project),
        }
    }

    /// All rings (exterior and holes) as vertex lists, for drawing outlines
    pub fn rings(&self) -> Vec<Vec<(f64, f64)>> {
        self.parts
            .iter()
            .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors()))
            .map(|ring| ring.coords().map(|c| (c.x, c.y)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CRS;
    use geo::LineString;

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
    fn strict_interior() {
        let region = BoundaryRegion::from_polygon(square(0.0, 0.0, 10.0));
        assert!(region.contains(5.0, 5.0));
        assert!(!region.contains(10.0, 5.0), "outer edge is outside");
        assert!(!region.contains(0.0, 0.0), "vertex is outside");
        assert!(!region.contains(11.0, 5.0));
    }

    #[test]
    fn shared_edge_between_parts_is_inside() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 10.0),
            square(10.0, 0.0, 10.0),
        ]))
        .unwrap();
        assert!(region.contains(10.0, 5.0));
        assert!(!region.contains(20.0, 5.0));
    }

    #[test]
    fn shared_edge_endpoints_on_the_outline_are_outside() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 10.0),
            square(10.0, 0.0, 10.0),
        ]))
        .unwrap();
        assert!(!region.contains(10.0, 0.0), "bottom end of the shared edge");
        assert!(!region.contains(10.0, 10.0), "top end of the shared edge");
        assert!(!region.contains(5.0, 0.0));
    }

    #[test]
    fn parts_touching_at_a_corner() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 10.0),
            square(10.0, 10.0, 10.0),
        ]))
        .unwrap();
        assert!(!region.contains(10.0, 10.0));
        assert!(region.contains(5.0, 5.0));
        assert!(region.contains(15.0, 15.0));
        assert!(!region.contains(15.0, 5.0));
    }

    #[test]
    fn vertex_shared_by_four_parts_is_inside() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 10.0),
            square(10.0, 0.0, 10.0),
            square(0.0, 10.0, 10.0),
            square(10.0, 10.0, 10.0),
        ]))
        .unwrap();
        assert!(region.contains(10.0, 10.0));
        assert!(region.contains(10.0, 3.0));
        assert!(!region.contains(10.0, 20.0));
        assert_eq!(region.len(), 4);
        assert_eq!(region.rings().len(), 4);
    }

    #[test]
    fn holes_are_outside() {
        let outer = square(0.0, 0.0, 10.0);
        let hole = square(4.0, 4.0, 2.0);
        let poly = Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()]);
        let region = BoundaryRegion::from_polygon(poly);
        assert!(!region.contains(5.0, 5.0));
        assert!(region.contains(2.0, 2.0));
        assert_eq!(region.rings().len(), 2);
    }

    #[test]
    fn bounds_and_empty() {
        let region = BoundaryRegion::new(MultiPolygon::new(vec![
            square(0.0, 0.0, 1.0),
            square(5.0, -2.0, 1.0),
        ]))
        .unwrap();
        assert_eq!(region.bounds().unwrap(), (0.0, -2.0, 6.0, 1.0));
        assert!(matches!(
            BoundaryRegion::new(MultiPolygon::new(vec![])),
            Err(Error::EmptyGeometry)
        ));
    }

    #[test]
    fn transform_moves_vertices() {
        let region = BoundaryRegion::from_polygon(square(88.0, 21.0, 1.0));
        let t = Transformer::new(CRS::wgs84(), CRS::web_mercator()).unwrap();
        let projected = region.transform(&t);
        let (min_x, _, max_x, _) = projected.bounds().unwrap();
        assert!(min_x > 9_000_000.0);
        assert!(max_x > min_x);
        assert!(projected.contains(t.transform(88.5, 21.5).0, t.transform(88.5, 21.5).1));
    }
}
