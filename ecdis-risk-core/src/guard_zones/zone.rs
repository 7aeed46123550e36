//! Guard Zone Implementation
//!
//! Geographic guard zones (circle or polygon) and the check of whether a
//! position lies inside one.

use serde::{Deserialize, Serialize};

use crate::navigation::{distance_nm, normalize_delta, GeoPoint};

/// Guard zone shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZoneShape {
    /// Circle around a fixed position
    #[serde(rename_all = "camelCase")]
    Circle {
        center: GeoPoint,
        /// Radius in nautical miles
        radius_nm: f64,
    },
    /// Closed polygon, the last vertex connects back to the first
    #[serde(rename_all = "camelCase")]
    Polygon { vertices: Vec<GeoPoint> },
}

impl ZoneShape {
    /// Check if a position is inside this shape
    pub fn contains(&self, point: GeoPoint) -> bool {
        match self {
            ZoneShape::Circle { center, radius_nm } => distance_nm(*center, point) <= *radius_nm,
            ZoneShape::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }
}

/// Ray casting in the lat/lon plane, longitudes taken relative to the point
/// so polygons spanning the antimeridian work.
fn polygon_contains(vertices: &[GeoPoint], point: GeoPoint) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = (normalize_delta(vertices[i].lon - point.lon), vertices[i].lat);
        let (xj, yj) = (normalize_delta(vertices[j].lon - point.lon), vertices[j].lat);

        if (yi > point.lat) != (yj > point.lat) {
            let x_cross = xi + (point.lat - yi) * (xj - xi) / (yj - yi);
            if 0.0 < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Guard zone definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardZone {
    /// Zone identifier
    pub id: u32,
    /// Optional zone name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Zone shape
    pub shape: ZoneShape,
    /// Whether the zone is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Zone moves with own ship, so own ship can never enter it
    #[serde(default)]
    pub attached_to_ship: bool,
}

fn default_true() -> bool {
    true
}

impl GuardZone {
    /// Create a new circular guard zone
    pub fn new_circle(id: u32, center: GeoPoint, radius_nm: f64) -> Self {
        GuardZone {
            id,
            name: None,
            shape: ZoneShape::Circle { center, radius_nm },
            active: true,
            attached_to_ship: false,
        }
    }

    /// Create a new polygon guard zone
    pub fn new_polygon(id: u32, vertices: Vec<GeoPoint>) -> Self {
        GuardZone {
            id,
            name: None,
            shape: ZoneShape::Polygon { vertices },
            active: true,
            attached_to_ship: false,
        }
    }

    /// Whether own-ship track entries into this zone are assessed
    pub fn is_assessable(&self) -> bool {
        self.active && !self.attached_to_ship
    }

    /// Threat id used for risk results about this zone
    pub fn threat_id(&self) -> String {
        format!("zone-{}", self.id)
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        self.shape.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lon: f64, size: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(lat, lon),
            GeoPoint::new(lat, lon + size),
            GeoPoint::new(lat + size, lon + size),
            GeoPoint::new(lat + size, lon),
        ]
    }

    #[test]
    fn test_circle_contains() {
        let zone = GuardZone::new_circle(1, GeoPoint::new(50.0, -1.0), 0.5);
        assert!(zone.contains(GeoPoint::new(50.0, -1.0)));
        assert!(zone.contains(GeoPoint::new(50.0 + 0.4 / 60.0, -1.0)));
        assert!(!zone.contains(GeoPoint::new(50.0 + 0.6 / 60.0, -1.0)));
    }

    #[test]
    fn test_polygon_contains() {
        let zone = GuardZone::new_polygon(2, square(50.0, -1.0, 0.1));
        assert!(zone.contains(GeoPoint::new(50.05, -0.95)));
        assert!(!zone.contains(GeoPoint::new(50.15, -0.95)));
        assert!(!zone.contains(GeoPoint::new(50.05, -1.05)));
        assert!(!zone.contains(GeoPoint::new(50.05, -0.85)));
    }

    #[test]
    fn test_polygon_across_antimeridian() {
        let zone = GuardZone::new_polygon(3, square(10.0, 179.95, 0.1));
        assert!(zone.contains(GeoPoint::new(10.05, -179.98)));
        assert!(zone.contains(GeoPoint::new(10.05, 179.99)));
        assert!(!zone.contains(GeoPoint::new(10.05, -179.9)));
    }

    #[test]
    fn test_degenerate_polygon() {
        let zone = GuardZone::new_polygon(4, square(0.0, 0.0, 1.0)[..2].to_vec());
        assert!(!zone.contains(GeoPoint::new(0.0, 0.5)));
    }

    #[test]
    fn test_assessable() {
        let mut zone = GuardZone::new_circle(7, GeoPoint::new(1.0, 1.0), 1.0);
        assert!(zone.is_assessable());
        assert_eq!(zone.threat_id(), "zone-7");

        zone.attached_to_ship = true;
        assert!(!zone.is_assessable());

        zone.attached_to_ship = false;
        zone.active = false;
        assert!(!zone.is_assessable());
    }

    #[test]
    fn test_zone_deserialize_defaults() {
        let json = r#"{"id": 5, "shape": {"type": "circle", "center": {"lat": 1.0, "lon": 2.0}, "radiusNm": 0.5}}"#;
        let zone: GuardZone = serde_json::from_str(json).unwrap();
        assert!(zone.active);
        assert!(!zone.attached_to_ship);
        assert_eq!(
            zone.shape,
            ZoneShape::Circle {
                center: GeoPoint::new(1.0, 2.0),
                radius_nm: 0.5
            }
        );
    }
}
