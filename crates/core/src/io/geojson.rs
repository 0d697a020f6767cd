//! GeoJSON boundary polygons

use crate::error::{Error, Result};
use crate::vector::BoundaryRegion;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;
use std::path::Path;

/// Read a boundary region from a GeoJSON file.
///
/// Accepts a `FeatureCollection`, a single `Feature`, or a bare `Polygon` /
/// `MultiPolygon` geometry. All polygon parts are merged into one region;
/// features with a null geometry are skipped.
pub fn read_boundary<P: AsRef<Path>>(path: P) -> Result<BoundaryRegion> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_boundary(&text)
}

pub fn parse_boundary(text: &str) -> Result<BoundaryRegion> {
    let root: Value = serde_json::from_str(text)?;
    let mut polygons = Vec::new();
    collect_polygons(&root, &mut polygons)?;
    BoundaryRegion::new(MultiPolygon::new(polygons))
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Parse("GeoJSON object without \"type\"".into()))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::Parse("FeatureCollection without \"features\"".into()))?;
            for feature in features {
                collect_polygons(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_polygons(geometry, out)?,
        },
        "GeometryCollection" => {
            let geometries = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::Parse("GeometryCollection without \"geometries\"".into()))?;
            for geometry in geometries {
                collect_polygons(geometry, out)?;
            }
        }
        "Polygon" => out.push(parse_polygon(coordinates(value)?)?),
        "MultiPolygon" => {
            let parts = coordinates(value)?
                .as_array()
                .ok_or_else(|| Error::Parse("MultiPolygon coordinates must be an array".into()))?;
            for part in parts {
                out.push(parse_polygon(part)?);
            }
        }
        other => return Err(Error::UnsupportedGeometry(other.to_string())),
    }
    Ok(())
}

fn coordinates(geometry: &Value) -> Result<&Value> {
    geometry
        .get("coordinates")
        .ok_or_else(|| Error::Parse("geometry without \"coordinates\"".into()))
}

fn parse_polygon(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| Error::Parse("polygon rings must be an array".into()))?;
    let mut parsed = rings.iter().map(parse_ring);
    let exterior = parsed
        .next()
        .ok_or_else(|| Error::Parse("polygon without exterior ring".into()))??;
    let interiors = parsed.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| Error::Parse("ring must be an array of positions".into()))?;
    if positions.len() < 4 {
        return Err(Error::Parse(format!(
            "ring needs at least 4 positions, found {}",
            positions.len()
        )));
    }
    positions
        .iter()
        .map(|pos| {
            let x = pos.get(0).and_then(Value::as_f64);
            let y = pos.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(Error::Parse(format!("invalid position {pos}"))),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}
