//! Polygon masks restricting where a field reports values.
//!
//! Masks use the GeoJSON geometry layout (`{"type": "Polygon",
//! "coordinates": [...]}`) and are consumed only through point-in-polygon
//! tests. Geometry is not validated beyond ring length.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A closed ring of `[lon, lat]` positions.
pub type Ring = Vec<[f64; 2]>;

/// A GeoJSON `Polygon` or `MultiPolygon` used as a spatial mask.
///
/// The first ring of each polygon is its exterior; the remaining rings are
/// holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum SpatialMask {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl SpatialMask {
    /// Reads a mask from a GeoJSON geometry, `Feature` or single-feature
    /// `FeatureCollection`.
    pub fn from_geojson(value: &Value) -> Result<Self, FieldError> {
        let geometry = match value.get("type").and_then(Value::as_str) {
            Some("Feature") => value
                .get("geometry")
                .ok_or_else(|| FieldError::InvalidMask("feature has no geometry".into()))?,
            Some("FeatureCollection") => {
                let features = value
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| FieldError::InvalidMask("collection has no features".into()))?;
                match features.as_slice() {
                    [feature] => return Self::from_geojson(feature),
                    _ => {
                        return Err(FieldError::InvalidMask(format!(
                            "expected exactly one feature, found {}",
                            features.len()
                        )))
                    }
                }
            }
            _ => value,
        };
        let mask: SpatialMask = serde_json::from_value(geometry.clone())
            .map_err(|e| FieldError::InvalidMask(e.to_string()))?;
        mask.check_rings()?;
        Ok(mask)
    }

    /// Point-in-polygon test using even-odd ray casting. Points inside a hole
    /// are outside the mask.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            SpatialMask::Polygon(rings) => polygon_contains(rings, lon, lat),
            SpatialMask::MultiPolygon(polygons) => polygons
                .iter()
                .any(|rings| polygon_contains(rings, lon, lat)),
        }
    }

    fn check_rings(&self) -> Result<(), FieldError> {
        let rings: Vec<&Ring> = match self {
            SpatialMask::Polygon(rings) => rings.iter().collect(),
            SpatialMask::MultiPolygon(polygons) => polygons.iter().flatten().collect(),
        };
        if rings.is_empty() {
            return Err(FieldError::InvalidMask("geometry has no rings".into()));
        }
        match rings.iter().find(|r| r.len() < 3) {
            Some(short) => Err(FieldError::InvalidMask(format!(
                "ring has {} positions, need at least 3",
                short.len()
            ))),
            None => Ok(()),
        }
    }
}

fn polygon_contains(rings: &[Ring], lon: f64, lat: f64) -> bool {
    match rings.split_first() {
        Some((exterior, holes)) => {
            ring_contains(exterior, lon, lat) && !holes.iter().any(|h| ring_contains(h, lon, lat))
        }
        None => false,
    }
}

fn ring_contains(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]
    }

    #[test]
    fn polygon_contains_interior_point() {
        let mask = SpatialMask::Polygon(vec![square(0.0, 0.0, 10.0, 10.0)]);
        assert!(mask.contains(5.0, 5.0));
        assert!(!mask.contains(15.0, 5.0));
        assert!(!mask.contains(5.0, -1.0));
    }

    #[test]
    fn hole_excludes_points() {
        let mask = SpatialMask::Polygon(vec![
            square(0.0, 0.0, 10.0, 10.0),
            square(4.0, 4.0, 6.0, 6.0),
        ]);
        assert!(!mask.contains(5.0, 5.0));
        assert!(mask.contains(2.0, 2.0));
    }

    #[test]
    fn multipolygon_contains_point_in_any_part() {
        let mask = SpatialMask::MultiPolygon(vec![
            vec![square(0.0, 0.0, 1.0, 1.0)],
            vec![square(5.0, 5.0, 6.0, 6.0)],
        ]);
        assert!(mask.contains(0.5, 0.5));
        assert!(mask.contains(5.5, 5.5));
        assert!(!mask.contains(3.0, 3.0));
    }

    #[test]
    fn non_convex_polygon() {
        // L-shaped ring: the notch at the top right is outside
        let ring = vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 2.0],
            [2.0, 2.0],
            [2.0, 4.0],
            [0.0, 4.0],
            [0.0, 0.0],
        ];
        let mask = SpatialMask::Polygon(vec![ring]);
        assert!(mask.contains(1.0, 3.0));
        assert!(mask.contains(3.0, 1.0));
        assert!(!mask.contains(3.0, 3.0));
    }

    #[test]
    fn from_geojson_reads_bare_geometry() {
        let geo = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
        });
        let mask = SpatialMask::from_geojson(&geo).unwrap();
        assert!(mask.contains(1.0, 1.0));
    }

    #[test]
    fn from_geojson_unwraps_feature_and_collection() {
        let feature = json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
            }
        });
        assert!(SpatialMask::from_geojson(&feature).is_ok());
        let collection = json!({"type": "FeatureCollection", "features": [feature]});
        let mask = SpatialMask::from_geojson(&collection).unwrap();
        assert!(matches!(mask, SpatialMask::MultiPolygon(_)));
    }

    #[test]
    fn from_geojson_rejects_unsupported_or_degenerate_input() {
        let point = json!({"type": "Point", "coordinates": [0.0, 0.0]});
        assert!(matches!(
            SpatialMask::from_geojson(&point),
            Err(FieldError::InvalidMask(_))
        ));
        let short = json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]]});
        assert!(SpatialMask::from_geojson(&short).is_err());
        let empty = json!({"type": "Polygon", "coordinates": []});
        assert!(SpatialMask::from_geojson(&empty).is_err());
        let two = json!({"type": "FeatureCollection", "features": []});
        assert!(SpatialMask::from_geojson(&two).is_err());
    }

    #[test]
    fn serializes_as_geojson_geometry() {
        let mask = SpatialMask::Polygon(vec![square(0.0, 0.0, 1.0, 1.0)]);
        let v = serde_json::to_value(&mask).unwrap();
        assert_eq!(v["type"], "Polygon");
        assert_eq!(v["coordinates"][0][2], json!([1.0, 1.0]));
    }
}
