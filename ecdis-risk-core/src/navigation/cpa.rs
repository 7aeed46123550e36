//! CPA/TCPA Calculation
//!
//! Computes Closest Point of Approach (CPA) and Time to CPA (TCPA)
//! between two vessels from their position, course and speed.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::geodesy::{bearing_deg, normalize_delta, GeoPoint, NM_PER_DEGREE};

/// Relative speed (knots) below which two vessels are considered to keep
/// station with each other
const MIN_RELATIVE_SPEED_KN: f64 = 0.1;

/// TCPA beyond this horizon (minutes) is not meaningful
const MAX_TCPA_MINUTES: f64 = 24.0 * 60.0;

/// Fastest plausible vessel speed in knots
const MAX_SOG_KN: f64 = 100.0;

/// Kinematic input for a CPA/TCPA calculation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselState {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Course over ground in degrees (0-360)
    pub cog: f64,
    /// Speed over ground in knots
    pub sog: f64,
}

impl VesselState {
    pub fn new(lat: f64, lon: f64, cog: f64, sog: f64) -> Self {
        VesselState { lat, lon, cog, sog }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Velocity in knots as (east, north)
    fn velocity(&self) -> Vector2<f64> {
        let course = self.cog.to_radians();
        Vector2::new(self.sog * course.sin(), self.sog * course.cos())
    }

    pub(crate) fn is_valid_for_calculation(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
            && (0.0..360.0).contains(&self.cog)
            && (0.0..=MAX_SOG_KN).contains(&self.sog)
    }
}

/// Convergence status of a CPA/TCPA calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CpaStatus {
    /// Vessels are closing, CPA lies in the future
    Approaching,
    /// Relative motion is negligible, range stays constant
    StationaryRelative,
    /// CPA lies in the past, vessels are opening
    Diverging,
    /// CPA lies too far in the future to be meaningful
    OutOfRange,
    /// Position, course or speed outside the valid domain
    InvalidMotionData,
}

/// Result of CPA/TCPA calculation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpaResult {
    /// Closest Point of Approach in nautical miles
    pub cpa: f64,
    /// Time to Closest Point of Approach in minutes
    /// Positive = future, Negative = past
    pub tcpa: f64,
    /// Present range in nautical miles
    pub current_range: f64,
    /// True bearing from own ship to target in degrees
    pub relative_bearing: f64,
    /// Magnitude of the relative velocity in knots
    pub relative_speed: f64,
    pub status: CpaStatus,
}

impl CpaResult {
    fn invalid() -> Self {
        CpaResult {
            cpa: 0.0,
            tcpa: 0.0,
            current_range: 0.0,
            relative_bearing: 0.0,
            relative_speed: 0.0,
            status: CpaStatus::InvalidMotionData,
        }
    }

    /// Whether the result describes a usable encounter
    pub fn is_valid(&self) -> bool {
        matches!(
            self.status,
            CpaStatus::Approaching | CpaStatus::StationaryRelative
        )
    }
}

/// Calculate CPA and TCPA between own ship and target
///
/// Uses relative velocity method on a local flat-earth plane:
/// 1. Compute relative position (target - own ship) in NM east/north
/// 2. Compute relative velocity in knots
/// 3. Find time when distance is minimized
pub fn calculate_cpa_tcpa(own_ship: &VesselState, target: &VesselState) -> CpaResult {
    if !own_ship.is_valid_for_calculation() || !target.is_valid_for_calculation() {
        return CpaResult::invalid();
    }

    // Relative position in NM, scaled at the mean latitude
    let mean_lat = ((own_ship.lat + target.lat) / 2.0).to_radians();
    let r = Vector2::new(
        normalize_delta(target.lon - own_ship.lon) * NM_PER_DEGREE * mean_lat.cos(),
        (target.lat - own_ship.lat) * NM_PER_DEGREE,
    );
    let current_range = r.norm();
    let relative_bearing = bearing_deg(own_ship.position(), target.position());

    // Relative velocity (target velocity - own ship velocity)
    let v = target.velocity() - own_ship.velocity();
    let relative_speed = v.norm();

    if relative_speed < MIN_RELATIVE_SPEED_KN {
        // Same course and speed: CPA is the current range, TCPA undefined (0)
        return CpaResult {
            cpa: current_range,
            tcpa: 0.0,
            current_range,
            relative_bearing,
            relative_speed,
            status: CpaStatus::StationaryRelative,
        };
    }

    // TCPA = -(r · v) / |v|², in hours
    let tcpa_hours = -r.dot(&v) / v.norm_squared();
    let cpa = (r + v * tcpa_hours).norm();
    let tcpa = tcpa_hours * 60.0;

    let status = if tcpa < 0.0 {
        CpaStatus::Diverging
    } else if tcpa > MAX_TCPA_MINUTES {
        CpaStatus::OutOfRange
    } else {
        CpaStatus::Approaching
    };

    CpaResult {
        cpa,
        tcpa,
        current_range,
        relative_bearing,
        relative_speed,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_on_collision() {
        // Target 12 NM east on the equator, both at 10 knots towards each other
        let own_ship = VesselState::new(0.0, 1.0, 90.0, 10.0);
        let target = VesselState::new(0.0, 1.2, 270.0, 10.0);

        let result = calculate_cpa_tcpa(&own_ship, &target);

        assert_eq!(result.status, CpaStatus::Approaching);
        // 12 NM closing at 20 knots = 36 minutes
        assert!((result.tcpa - 36.0).abs() < 0.1);
        assert!(result.cpa < 0.001);
        assert!((result.relative_speed - 20.0).abs() < 1e-9);
        assert!((result.relative_bearing - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_parallel_course() {
        // Target 1 NM to starboard, same course and speed
        let own_ship = VesselState::new(50.0, 0.0, 0.0, 12.0);
        let target = VesselState::new(50.0, 1.0 / (60.0 * 50f64.to_radians().cos()), 0.0, 12.0);

        let result = calculate_cpa_tcpa(&own_ship, &target);

        assert_eq!(result.status, CpaStatus::StationaryRelative);
        assert!(result.is_valid());
        assert_eq!(result.tcpa, 0.0);
        assert!((result.cpa - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_crossing_situation() {
        // Target 2 NM north-west, heading east across our bow
        let own_ship = VesselState::new(0.0, 0.0, 0.0, 10.0);
        let target = VesselState::new(
            2.0 / 60.0 * std::f64::consts::FRAC_1_SQRT_2,
            -2.0 / 60.0 * std::f64::consts::FRAC_1_SQRT_2,
            90.0,
            10.0,
        );

        let result = calculate_cpa_tcpa(&own_ship, &target);

        assert_eq!(result.status, CpaStatus::Approaching);
        assert!(result.tcpa > 0.0);
        // Symmetric crossing at equal speeds meets exactly
        assert!(result.cpa < 0.01);
    }

    #[test]
    fn test_receding_target() {
        // Target ahead, moving away faster than we follow
        let own_ship = VesselState::new(10.0, 10.0, 0.0, 5.0);
        let target = VesselState::new(10.05, 10.0, 0.0, 15.0);

        let result = calculate_cpa_tcpa(&own_ship, &target);

        assert_eq!(result.status, CpaStatus::Diverging);
        assert!(!result.is_valid());
        assert!(result.tcpa < 0.0);
    }

    #[test]
    fn test_out_of_range() {
        // Almost matching speeds, far apart: TCPA days away
        let own_ship = VesselState::new(0.0, 0.0, 90.0, 10.0);
        let target = VesselState::new(0.0, 5.0, 90.0, 9.8);

        let result = calculate_cpa_tcpa(&own_ship, &target);

        assert_eq!(result.status, CpaStatus::OutOfRange);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_invalid_motion_data() {
        let own_ship = VesselState::new(0.0, 0.0, 360.0, 10.0);
        let target = VesselState::new(0.0, 0.1, 90.0, 10.0);
        assert_eq!(
            calculate_cpa_tcpa(&own_ship, &target).status,
            CpaStatus::InvalidMotionData
        );

        let own_ship = VesselState::new(0.0, 0.0, 0.0, 150.0);
        assert_eq!(
            calculate_cpa_tcpa(&own_ship, &target).status,
            CpaStatus::InvalidMotionData
        );
    }
}
