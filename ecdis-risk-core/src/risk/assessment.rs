//! Collision Risk Assessment
//!
//! Multi-horizon CPA/TCPA search for AIS targets and own-ship track entry
//! checks for guard zones.
//!
//! For every look-ahead horizon (1 minute steps up to `max_prediction_time`)
//! both vessels are predicted forward and the CPA/TCPA primitive is applied
//! to the predicted states. The horizon with the smallest valid CPA decides
//! the result; ties keep the earliest horizon.

use crate::guard_zones::GuardZone;
use crate::navigation::{bearing_deg, calculate_cpa_tcpa, normalize_degrees, CpaResult, GeoPoint};

use super::classifier::{classify, probability};
use super::motion::KinematicState;
use super::predictor::PositionPredictor;
use super::types::{
    CollisionRiskResult, EnvironmentalConditions, RiskAssessmentConfig, RiskLevel, ThreatType,
};

/// Spacing of the look-ahead horizons in seconds
const HORIZON_STEP_SECS: f64 = 60.0;

/// Best encounter found by the horizon search
struct Encounter {
    cpa: CpaResult,
    collision_point: GeoPoint,
    /// |Δsog| of the predicted states in knots
    speed_difference: f64,
}

/// Keep `best` unless `candidate` has a strictly smaller CPA, so ties stay
/// with the earlier horizon.
fn keep_closest(best: Option<Encounter>, candidate: Encounter) -> Option<Encounter> {
    match best {
        Some(best) if best.cpa.cpa <= candidate.cpa.cpa => Some(best),
        _ => Some(candidate),
    }
}

/// Assesses targets and guard zones against own ship
pub struct RiskAssessor<'a> {
    config: &'a RiskAssessmentConfig,
    predictor: PositionPredictor<'a>,
}

impl<'a> RiskAssessor<'a> {
    pub fn new(config: &'a RiskAssessmentConfig, environment: &'a EnvironmentalConditions) -> Self {
        RiskAssessor {
            config,
            predictor: PositionPredictor::new(config, environment),
        }
    }

    fn horizons(&self) -> impl Iterator<Item = f64> {
        let count = self.config.max_prediction_time.max(0.0).floor() as u32;
        (1..=count).map(|m| m as f64)
    }

    /// Assess one AIS target.
    ///
    /// Returns `None` when either state is invalid, no horizon produced a
    /// usable encounter, or the encounter classifies as no risk.
    pub fn assess_target(
        &self,
        own_ship: &KinematicState,
        target_id: &str,
        target: &KinematicState,
        now: u64,
    ) -> Option<CollisionRiskResult> {
        if !own_ship.is_valid() || !target.is_valid() || target_id.is_empty() {
            return None;
        }

        let mut best: Option<Encounter> = None;
        for minutes in self.horizons() {
            let seconds = minutes * HORIZON_STEP_SECS;
            let own_future = self.predictor.predict(own_ship, seconds);
            let target_future = self.predictor.predict(target, seconds);

            let cpa = calculate_cpa_tcpa(&own_future.vessel_state(), &target_future.vessel_state());
            if !cpa.is_valid() {
                continue;
            }
            best = keep_closest(
                best,
                Encounter {
                    cpa,
                    collision_point: target_future.position(),
                    speed_difference: (own_future.sog - target_future.sog).abs(),
                },
            );
        }
        let best = best?;

        let level = classify(self.config, best.cpa.cpa, best.cpa.tcpa, best.speed_difference);
        if level == RiskLevel::None {
            return None;
        }

        let relative_bearing = normalize_degrees(
            bearing_deg(own_ship.position(), target.position()) - own_ship.cog,
        );

        Some(CollisionRiskResult {
            risk_level: level,
            collision_probability: probability(
                self.config,
                best.cpa.cpa,
                best.cpa.tcpa,
                best.speed_difference,
            ),
            time_to_collision: best.cpa.tcpa,
            min_distance: best.cpa.cpa,
            collision_point: best.collision_point,
            threat_id: target_id.to_string(),
            threat_type: ThreatType::AisVessel,
            predicted_collision_time: minutes_after(now, best.cpa.tcpa),
            threat_speed: target.sog,
            threat_course: target.cog,
            relative_speed: best.speed_difference,
            relative_bearing,
            calculation_time_ms: 0,
            calculation_timestamp: now,
        })
    }

    /// Check whether the predicted own-ship track enters a guard zone.
    ///
    /// The track is sampled at the present position and then once a minute;
    /// the first sample inside the zone is the entry point.
    pub fn assess_guard_zone(
        &self,
        own_ship: &KinematicState,
        zone: &GuardZone,
        now: u64,
    ) -> Option<CollisionRiskResult> {
        if !own_ship.is_valid() || !zone.is_assessable() {
            return None;
        }

        let (minutes, entry) = std::iter::once(0.0)
            .chain(self.horizons())
            .map(|m| (m, self.predictor.predict(own_ship, m * HORIZON_STEP_SECS)))
            .find(|(_, predicted)| zone.contains(predicted.position()))?;

        let level = classify(self.config, 0.0, minutes, own_ship.sog);
        if level == RiskLevel::None {
            return None;
        }

        let relative_bearing = if minutes == 0.0 {
            0.0
        } else {
            normalize_degrees(bearing_deg(own_ship.position(), entry.position()) - own_ship.cog)
        };

        Some(CollisionRiskResult {
            risk_level: level,
            collision_probability: probability(self.config, 0.0, minutes, own_ship.sog),
            time_to_collision: minutes,
            min_distance: 0.0,
            collision_point: entry.position(),
            threat_id: zone.threat_id(),
            threat_type: ThreatType::GuardZone,
            predicted_collision_time: minutes_after(now, minutes),
            threat_speed: 0.0,
            threat_course: 0.0,
            relative_speed: own_ship.sog,
            relative_bearing,
            calculation_time_ms: 0,
            calculation_timestamp: now,
        })
    }
}

fn minutes_after(now: u64, minutes: f64) -> u64 {
    now.saturating_add((minutes.max(0.0) * 60_000.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::normalize_delta;

    const NOW: u64 = 1_700_000_000_000;

    fn vessel(lat: f64, lon: f64, cog: f64, sog: f64) -> KinematicState {
        let mut state = KinematicState::default();
        state.observe(lat, lon, cog, sog, 0.0, NOW);
        state
    }

    #[test]
    fn test_head_on_encounter() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let own = vessel(0.0, 1.0, 90.0, 10.0);
        let target = vessel(0.0, 1.2, 270.0, 10.0);

        let result = assessor
            .assess_target(&own, "244123456", &target, NOW)
            .unwrap();

        assert!(result.is_valid());
        assert!(result.risk_level >= RiskLevel::Medium);
        assert_eq!(result.threat_id, "244123456");
        assert_eq!(result.threat_type, ThreatType::AisVessel);
        // 12 NM closing at 20 kn is 36 minutes; horizons start one minute ahead
        assert!(result.time_to_collision > 25.0 && result.time_to_collision < 36.0);
        assert!(result.min_distance < 0.01);
        assert_eq!(result.relative_speed, 0.0);
        assert_eq!(
            result.collision_probability,
            probability(
                &config,
                result.min_distance,
                result.time_to_collision,
                result.relative_speed
            )
        );
        assert!(normalize_delta(result.relative_bearing).abs() < 1e-6);
        assert!(result.predicted_collision_time > NOW);
    }

    #[test]
    fn test_probability_uses_reported_speed_difference() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        // Overtaking from astern: 14 kn against 6 kn, 1 NM apart on the same line
        let own = vessel(50.0, -1.0, 0.0, 14.0);
        let target = vessel(50.0 + 1.0 / 60.0, -1.0, 0.0, 6.0);

        let result = assessor.assess_target(&own, "1", &target, NOW).unwrap();
        assert!((result.relative_speed - 8.0).abs() < 1e-9);
        assert_eq!(
            result.collision_probability,
            probability(&config, result.min_distance, result.time_to_collision, 8.0)
        );
    }

    #[test]
    fn test_own_heading_north_as_360() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let target = vessel(50.0 + 3.0 / 60.0, -1.0, 180.0, 10.0);
        let north = assessor
            .assess_target(&vessel(50.0, -1.0, 0.0, 10.0), "1", &target, NOW)
            .unwrap();
        let north_360 = assessor
            .assess_target(&vessel(50.0, -1.0, 360.0, 10.0), "1", &target, NOW)
            .unwrap();

        assert!(north.risk_level >= RiskLevel::High);
        assert_eq!(north_360.risk_level, north.risk_level);
        assert_eq!(north_360.min_distance, north.min_distance);
    }

    #[test]
    fn test_equal_cpa_keeps_earliest_horizon() {
        let encounter = |cpa: f64, tcpa: f64| Encounter {
            cpa: CpaResult {
                cpa,
                tcpa,
                current_range: 2.0,
                relative_bearing: 0.0,
                relative_speed: 20.0,
                status: crate::navigation::CpaStatus::Approaching,
            },
            collision_point: GeoPoint::new(50.0, -1.0),
            speed_difference: 0.0,
        };

        let best = keep_closest(None, encounter(0.2, 5.0));
        let best = keep_closest(best, encounter(0.2, 4.0));
        assert_eq!(best.as_ref().map(|b| b.cpa.tcpa), Some(5.0));

        let best = keep_closest(best, encounter(0.1, 3.0));
        assert_eq!(best.as_ref().map(|b| b.cpa.tcpa), Some(3.0));

        let best = keep_closest(best, encounter(0.3, 2.0));
        assert_eq!(best.map(|b| b.cpa.tcpa), Some(3.0));
    }

    #[test]
    fn test_threat_id_is_tracking_key() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let own = vessel(0.0, 1.0, 90.0, 10.0);
        let a = vessel(0.0, 1.1, 270.0, 10.0);
        let b = vessel(0.0, 1.15, 270.0, 8.0);

        let ra = assessor.assess_target(&own, "111", &a, NOW).unwrap();
        let rb = assessor.assess_target(&own, "222", &b, NOW).unwrap();
        assert_eq!(ra.threat_id, "111");
        assert_eq!(rb.threat_id, "222");
    }

    #[test]
    fn test_close_quarters_is_critical() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        // 1.5 NM apart, closing at 20 kn: TCPA after the first horizon is 3.5 minutes
        let own = vessel(0.0, 1.0, 90.0, 10.0);
        let target = vessel(0.0, 1.025, 270.0, 10.0);

        let result = assessor.assess_target(&own, "1", &target, NOW).unwrap();
        assert!(result.risk_level >= RiskLevel::High);
    }

    #[test]
    fn test_diverging_target_has_no_risk() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let own = vessel(0.0, 1.0, 270.0, 10.0);
        let target = vessel(0.0, 1.05, 90.0, 10.0);

        assert!(assessor.assess_target(&own, "1", &target, NOW).is_none());
    }

    #[test]
    fn test_wide_passing_has_no_risk() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        // Reciprocal courses 3 NM apart
        let own = vessel(0.0, 1.0, 90.0, 10.0);
        let target = vessel(0.05, 1.1, 270.0, 10.0);

        assert!(assessor.assess_target(&own, "1", &target, NOW).is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let own = vessel(0.0, 1.0, 90.0, 10.0);
        let target = vessel(0.0, 1.2, 270.0, 10.0);

        assert!(assessor
            .assess_target(&KinematicState::default(), "1", &target, NOW)
            .is_none());
        assert!(assessor
            .assess_target(&own, "1", &KinematicState::default(), NOW)
            .is_none());
        assert!(assessor.assess_target(&own, "", &target, NOW).is_none());
    }

    #[test]
    fn test_guard_zone_entry() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        // Zone 1 NM ahead with 0.25 NM radius, own ship at 6 kn covers 0.1 NM a minute
        let own = vessel(50.0, -1.0, 0.0, 6.0);
        let zone = GuardZone::new_circle(9, GeoPoint::new(50.0 + 1.0 / 60.0, -1.0), 0.25);

        let result = assessor.assess_guard_zone(&own, &zone, NOW).unwrap();
        assert_eq!(result.threat_id, "zone-9");
        assert_eq!(result.threat_type, ThreatType::GuardZone);
        assert_eq!(result.min_distance, 0.0);
        assert_eq!(result.time_to_collision, 8.0);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.collision_probability, 1.0);
        assert_eq!(result.predicted_collision_time, NOW + 8 * 60_000);
    }

    #[test]
    fn test_guard_zone_already_inside() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let own = vessel(50.0, -1.0, 0.0, 6.0);
        let zone = GuardZone::new_circle(1, GeoPoint::new(50.0, -1.0), 0.5);

        let result = assessor.assess_guard_zone(&own, &zone, NOW).unwrap();
        assert_eq!(result.time_to_collision, 0.0);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_guard_zone_out_of_reach() {
        let config = RiskAssessmentConfig::default();
        let env = EnvironmentalConditions::default();
        let assessor = RiskAssessor::new(&config, &env);

        let own = vessel(50.0, -1.0, 180.0, 6.0);
        let ahead = GuardZone::new_circle(1, GeoPoint::new(50.0 + 1.0 / 60.0, -1.0), 0.25);
        assert!(assessor.assess_guard_zone(&own, &ahead, NOW).is_none());

        let mut attached = GuardZone::new_circle(2, GeoPoint::new(50.0, -1.0), 0.5);
        attached.attached_to_ship = true;
        assert!(assessor.assess_guard_zone(&own, &attached, NOW).is_none());
    }
}
