//! Rhumbline Geodesy
//!
//! Position projection and distance/bearing between two points along a
//! rhumbline (loxodrome) on a spherical earth. Accurate enough for the
//! short look-ahead horizons used in collision prediction.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Mean earth radius in nautical miles
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Nautical miles per degree of latitude
pub const NM_PER_DEGREE: f64 = 60.0;

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees (positive north)
    pub lat: f64,
    /// Longitude in degrees (positive east)
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

/// Normalize an angle to the 0-360 range
pub fn normalize_degrees(degrees: f64) -> f64 {
    let mut d = degrees % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    // -1e-17 % 360 + 360 rounds to exactly 360
    if d >= 360.0 {
        d -= 360.0;
    }
    d
}

/// Normalize a signed angle difference to the -180..=180 range
pub fn normalize_delta(degrees: f64) -> f64 {
    let d = normalize_degrees(degrees);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Ratio of latitude difference to Mercator-projected latitude difference.
///
/// Falls back to `cos(lat)` on east-west courses where both differences
/// vanish.
fn stretch_factor(phi1: f64, phi2: f64) -> f64 {
    let d_phi = phi2 - phi1;
    let d_psi = ((FRAC_PI_4 + phi2 / 2.0).tan() / (FRAC_PI_4 + phi1 / 2.0).tan()).ln();
    if d_psi.abs() > 1e-12 {
        d_phi / d_psi
    } else {
        phi1.cos()
    }
}

/// Project a position along a rhumbline.
///
/// # Arguments
///
/// * `from` - Start position
/// * `distance_nm` - Distance to travel in nautical miles
/// * `bearing_deg` - True bearing in degrees
pub fn project(from: GeoPoint, distance_nm: f64, bearing_deg: f64) -> GeoPoint {
    if distance_nm == 0.0 {
        return from;
    }

    let delta = distance_nm / EARTH_RADIUS_NM;
    let theta = bearing_deg.to_radians();
    let phi1 = from.lat.to_radians();

    let mut phi2 = phi1 + delta * theta.cos();
    // Rhumblines spiral into the poles, stop just short of them
    if phi2.abs() > FRAC_PI_2 {
        phi2 = phi2.signum() * (FRAC_PI_2 - 1e-9);
    }

    let q = stretch_factor(phi1, phi2);
    let d_lambda = delta * theta.sin() / q;

    GeoPoint {
        lat: phi2.to_degrees(),
        lon: wrap_longitude(from.lon + d_lambda.to_degrees()),
    }
}

/// Rhumbline distance in nautical miles
pub fn distance_nm(from: GeoPoint, to: GeoPoint) -> f64 {
    distance_and_bearing(from, to).0
}

/// Rhumbline bearing in degrees (0-360)
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    distance_and_bearing(from, to).1
}

/// Rhumbline distance (NM) and bearing (degrees) from `from` to `to`
pub fn distance_and_bearing(from: GeoPoint, to: GeoPoint) -> (f64, f64) {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let d_phi = phi2 - phi1;

    // Take the short way round across the antimeridian
    let d_lambda = normalize_delta(to.lon - from.lon).to_radians();

    let q = stretch_factor(phi1, phi2);
    let distance = (d_phi * d_phi + q * q * d_lambda * d_lambda).sqrt() * EARTH_RADIUS_NM;

    let d_psi = if q.abs() > 1e-12 { d_phi / q } else { 0.0 };
    let bearing = normalize_degrees(d_lambda.atan2(d_psi).to_degrees());

    (distance, bearing)
}
