//! Jurisdiction boundary sources.
//!
//! A boundary arrives either as GeoJSON or as the cached coordinate list
//! written by the boundary acquisition step:
//!
//! ```text
//! Polygon([(-0.51, 51.46), (-0.48, 51.54), ..., (-0.51, 51.46)])
//! ```
//!
//! Tuples in the cached form are `(lon, lat)`, matching GeoJSON axis order.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use geojson::GeoJson;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, warn};

use crate::{GeoError, GeoResult};

const CACHE_PREFIX: &str = "Polygon(";

/// Serialized jurisdiction polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundarySource {
    /// GeoJSON geometry, feature or feature collection
    GeoJson(String),
    /// Cached `Polygon([(lon, lat), ...])` text
    CoordinateList(String),
}

impl BoundarySource {
    /// Classify boundary text by its first non-blank character.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim_start().starts_with('{') {
            BoundarySource::GeoJson(text)
        } else {
            BoundarySource::CoordinateList(text)
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> GeoResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), bytes = text.len(), "Boundary file read");
        Ok(Self::from_text(text))
    }

    /// Parse into a single dissolved jurisdiction geometry in degrees.
    pub fn into_geometry(self) -> GeoResult<MultiPolygon<f64>> {
        let polygons = match self {
            BoundarySource::GeoJson(text) => parse_geojson(&text)?,
            BoundarySource::CoordinateList(text) => vec![parse_coordinate_list(&text)?],
        };
        for polygon in &polygons {
            check_ring(polygon.exterior())?;
            for interior in polygon.interiors() {
                check_ring(interior)?;
            }
        }
        Ok(dissolve(polygons))
    }
}

fn parse_geojson(text: &str) -> GeoResult<Vec<Polygon<f64>>> {
    let document: GeoJson = text.parse()?;
    let collection = geo::GeometryCollection::<f64>::try_from(&document)?;

    let mut polygons = Vec::new();
    collect_polygons(collection.0, &mut polygons);
    if polygons.is_empty() {
        return Err(GeoError::InvalidBoundary(
            "GeoJSON holds no Polygon or MultiPolygon geometry".to_string(),
        ));
    }
    Ok(polygons)
}

fn collect_polygons(geometries: Vec<geo::Geometry<f64>>, out: &mut Vec<Polygon<f64>>) {
    for geometry in geometries {
        match geometry {
            geo::Geometry::Polygon(polygon) => out.push(polygon),
            geo::Geometry::MultiPolygon(multi) => out.extend(multi.0),
            geo::Geometry::GeometryCollection(nested) => collect_polygons(nested.0, out),
            other => debug!(kind = geometry_kind(&other), "Ignoring non-areal boundary geometry"),
        }
    }
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        _ => "Polygonal",
    }
}

/// Parse `Polygon([(lon, lat), ...])`.
fn parse_coordinate_list(text: &str) -> GeoResult<Polygon<f64>> {
    let body = text
        .trim()
        .strip_prefix(CACHE_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .and_then(|rest| rest.strip_prefix('['))
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| {
            GeoError::InvalidBoundary("expected `Polygon([(lon, lat), ...])`".to_string())
        })?;

    let mut coords = Vec::new();
    let mut rest = body;
    while let Some(open) = rest.find('(') {
        let close = rest[open..].find(')').map(|i| open + i).ok_or_else(|| {
            GeoError::InvalidBoundary("unterminated coordinate tuple".to_string())
        })?;
        coords.push(parse_tuple(&rest[open + 1..close])?);
        rest = &rest[close + 1..];
    }
    if !rest.trim().trim_matches(',').trim().is_empty() {
        return Err(GeoError::InvalidBoundary(format!(
            "unexpected trailing text {:?}",
            rest.trim()
        )));
    }

    Ok(Polygon::new(LineString::from(coords), vec![]))
}

fn parse_tuple(tuple: &str) -> GeoResult<Coord<f64>> {
    let values: Vec<f64> = tuple
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| {
                GeoError::InvalidBoundary(format!("bad coordinate value {:?}", part.trim()))
            })
        })
        .collect::<GeoResult<_>>()?;
    // A third value is an elevation and is dropped
    match values.as_slice() {
        [lon, lat] | [lon, lat, _] => Ok(Coord { x: *lon, y: *lat }),
        _ => Err(GeoError::InvalidBoundary(format!(
            "expected (lon, lat), got ({tuple})"
        ))),
    }
}

fn check_ring(ring: &LineString<f64>) -> GeoResult<()> {
    for coord in ring.coords() {
        let (lon, lat) = (coord.x, coord.y);
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(GeoError::InvalidCoordinate { lat, lon });
        }
    }
    // Closed rings repeat the first vertex
    let distinct = ring.0.len().saturating_sub(usize::from(ring.is_closed()));
    if distinct < 3 {
        return Err(GeoError::InvalidBoundary(format!(
            "ring has {distinct} distinct vertices, need at least 3"
        )));
    }
    Ok(())
}

/// Union polygons into one jurisdiction. A single polygon is kept verbatim.
fn dissolve(mut polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    if polygons.len() == 1 {
        return MultiPolygon::new(polygons);
    }
    let count = polygons.len();
    let first = MultiPolygon::new(vec![polygons.remove(0)]);
    let dissolved = polygons
        .iter()
        .fold(first, |acc, polygon| acc.union(polygon));
    debug!(input = count, output = dissolved.0.len(), "Boundary polygons dissolved");
    dissolved
}

/// Write the cached coordinate-list form of a single-polygon jurisdiction.
///
/// Only the exterior ring is written; interior rings are dropped.
pub fn coordinate_cache(jurisdiction: &MultiPolygon<f64>) -> GeoResult<String> {
    let polygon = match jurisdiction.0.as_slice() {
        [polygon] => polygon,
        polygons => {
            return Err(GeoError::InvalidBoundary(format!(
                "coordinate cache holds one polygon, jurisdiction has {}",
                polygons.len()
            )))
        }
    };
    if !polygon.interiors().is_empty() {
        warn!(
            holes = polygon.interiors().len(),
            "Coordinate cache drops interior rings"
        );
    }

    let mut out = String::from("Polygon([");
    for (i, coord) in polygon.exterior().coords().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Debug keeps a trailing `.0` on integral values
        let _ = write!(out, "({:?}, {:?})", coord.x, coord.y);
    }
    out.push_str("])");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "Polygon([(0.0, 0.0), (1.0, 0.0), (0.5, 1.0), (0.0, 0.0)])";

    #[test]
    fn test_sniffs_source_kind() {
        assert!(matches!(
            BoundarySource::from_text("  {\"type\":\"Polygon\"}"),
            BoundarySource::GeoJson(_)
        ));
        assert!(matches!(
            BoundarySource::from_text(TRIANGLE),
            BoundarySource::CoordinateList(_)
        ));
    }

    #[test]
    fn test_parses_coordinate_list() {
        let geometry = BoundarySource::from_text(TRIANGLE).into_geometry().unwrap();
        assert_eq!(geometry.0.len(), 1);
        let exterior = geometry.0[0].exterior();
        assert_eq!(exterior.0[1], Coord { x: 1.0, y: 0.0 });
        assert_eq!(exterior.0[2], Coord { x: 0.5, y: 1.0 });
    }

    #[test]
    fn test_coordinate_list_accepts_python_float_forms() {
        let text = "Polygon([(-0.5, 51.0, 0.0), (1e-3, 51.0), (0.25, 51.5)])\n";
        let geometry = BoundarySource::from_text(text).into_geometry().unwrap();
        assert_eq!(geometry.0[0].exterior().0[1], Coord { x: 0.001, y: 51.0 });
    }

    #[test]
    fn test_rejects_malformed_coordinate_list() {
        for text in [
            "Polygon((0, 0), (1, 0))",
            "Polygon([(0.0, 0.0), (1.0 0.0), (0.5, 1.0)])",
            "Polygon([(0.0, 0.0), (1.0, 0.0)])",
            "Polygon([(0.0, 0.0), (1.0, 0.0), (0.5, 1.0)] junk)",
        ] {
            assert!(
                BoundarySource::from_text(text).into_geometry().is_err(),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let text = "Polygon([(0.0, 0.0), (1.0, 95.0), (0.5, 1.0)])";
        assert!(matches!(
            BoundarySource::from_text(text).into_geometry(),
            Err(GeoError::InvalidCoordinate { lat, .. }) if lat == 95.0
        ));
    }

    #[test]
    fn test_feature_collection_is_dissolved() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "west"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {"name": "east"},
                 "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]}},
                {"type": "Feature", "properties": {"name": "marker"},
                 "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}}
            ]
        }"#;
        let geometry = BoundarySource::from_text(text).into_geometry().unwrap();
        assert_eq!(geometry.0.len(), 1);
    }

    #[test]
    fn test_geojson_without_polygons_rejected() {
        let text = r#"{"type": "Point", "coordinates": [0.5, 0.5]}"#;
        assert!(matches!(
            BoundarySource::from_text(text).into_geometry(),
            Err(GeoError::InvalidBoundary(_))
        ));
        assert!(matches!(
            BoundarySource::from_text("{not json").into_geometry(),
            Err(GeoError::GeoJson(_))
        ));
    }

    #[test]
    fn test_coordinate_cache_format() {
        let geometry = BoundarySource::from_text(TRIANGLE).into_geometry().unwrap();
        assert_eq!(coordinate_cache(&geometry).unwrap(), TRIANGLE);
    }
}
