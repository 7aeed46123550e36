//! Kinematic state of own ship and tracked targets

use serde::{Deserialize, Serialize};

use crate::navigation::{normalize_degrees, normalize_delta, GeoPoint, VesselState};

/// Course change (degrees) between two observations that marks a vessel as turning
const TURNING_COG_DELTA_DEG: f64 = 2.0;

/// Rate of turn (degrees/minute) below which a turn is ignored
pub const MIN_RATE_OF_TURN: f64 = 0.1;

/// Position, motion and short-term trend of one vessel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinematicState {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Course over ground in degrees
    pub cog: f64,
    /// Speed over ground in knots
    pub sog: f64,
    /// Rate of turn in degrees per minute, positive to starboard
    pub rot: f64,
    /// Speed change since the previous observation (knots)
    pub sog_trend: f64,
    /// Course change since the previous observation (degrees)
    pub cog_trend: f64,
    pub is_turning: bool,
    /// Estimated turning radius in NM (0 when not turning)
    pub turning_radius: f64,
    /// Unix timestamp (ms) of the last observation
    pub last_update: Option<u64>,
    pub update_count: u32,
}

impl KinematicState {
    /// A state is usable only with a real fix, finite motion and a timestamp
    pub fn is_valid(&self) -> bool {
        self.last_update.is_some()
            && self.lat.is_finite()
            && self.lon.is_finite()
            && self.cog.is_finite()
            && self.sog.is_finite()
            && !(self.lat == 0.0 && self.lon == 0.0)
    }

    /// Seconds since the last observation, `None` if never observed
    pub fn age_secs(&self, now: u64) -> Option<f64> {
        self.last_update
            .map(|t| now.saturating_sub(t) as f64 / 1000.0)
    }

    /// Whether the state has not been refreshed for longer than `max_age_sec`
    pub fn is_older_than(&self, now: u64, max_age_sec: f64) -> bool {
        match self.age_secs(now) {
            Some(age) => age > max_age_sec,
            None => true,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Input for the CPA/TCPA primitive
    pub fn vessel_state(&self) -> VesselState {
        VesselState::new(self.lat, self.lon, normalize_degrees(self.cog), self.sog)
    }

    /// Fold a new observation into the state, updating the trend.
    ///
    /// The course is stored in [0, 360), so a sensor reporting north as 360
    /// or a negative course is accepted.
    pub fn observe(&mut self, lat: f64, lon: f64, cog: f64, sog: f64, rot: f64, now: u64) {
        let cog = normalize_degrees(cog);
        if self.is_valid() {
            self.sog_trend = sog - self.sog;
            self.cog_trend = normalize_delta(cog - self.cog);
            self.is_turning = self.cog_trend.abs() > TURNING_COG_DELTA_DEG;
            self.turning_radius = if self.is_turning && rot.abs() > MIN_RATE_OF_TURN {
                turning_radius(sog, rot)
            } else {
                0.0
            };
        }

        self.lat = lat;
        self.lon = lon;
        self.cog = cog;
        self.sog = sog;
        self.rot = rot;
        self.last_update = Some(now);
        self.update_count = self.update_count.saturating_add(1);
    }
}

/// Radius (NM) of the circle sailed at `sog` knots turning `rot` degrees/minute
pub fn turning_radius(sog: f64, rot: f64) -> f64 {
    sog * 60.0 / (rot.abs() * 2.0 * std::f64::consts::PI)
}
