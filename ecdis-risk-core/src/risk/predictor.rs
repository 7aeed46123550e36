//! Position Prediction
//!
//! Projects a kinematic state forward in time. Turning vessels follow a
//! circular track, everything else a straight rhumbline. The predicted
//! position can be drifted by the set of the current.

use crate::navigation::{normalize_degrees, project};

use super::motion::{turning_radius, KinematicState, MIN_RATE_OF_TURN};
use super::types::{EnvironmentalConditions, RiskAssessmentConfig};

/// Below this speed (knots) a vessel is treated as stationary
const MIN_MOVING_SPEED_KN: f64 = 0.1;

/// Turning circles tighter than this (NM) are predicted linearly
const MIN_TURNING_RADIUS_NM: f64 = 0.01;

/// Current set below this speed (knots) is ignored
const MIN_CURRENT_SPEED_KN: f64 = 0.1;

/// Predicts vessel positions with one configuration and environment
#[derive(Debug, Clone, Copy)]
pub struct PositionPredictor<'a> {
    config: &'a RiskAssessmentConfig,
    environment: &'a EnvironmentalConditions,
}

impl<'a> PositionPredictor<'a> {
    pub fn new(config: &'a RiskAssessmentConfig, environment: &'a EnvironmentalConditions) -> Self {
        PositionPredictor {
            config,
            environment,
        }
    }

    /// Predict `state` `seconds_ahead` seconds into the future.
    ///
    /// An invalid state yields the default (invalid) state.
    pub fn predict(&self, state: &KinematicState, seconds_ahead: f64) -> KinematicState {
        if !state.is_valid() {
            return KinematicState::default();
        }

        let mut predicted = if self.config.enable_circular_motion_prediction
            && state.is_turning
            && state.rot.abs() > MIN_RATE_OF_TURN
        {
            predict_circular(state, seconds_ahead)
        } else {
            predict_linear(state, seconds_ahead)
        };

        if self.config.enable_environmental_compensation {
            self.apply_current(&mut predicted, seconds_ahead);
        }

        predicted.last_update = state
            .last_update
            .map(|t| t.saturating_add((seconds_ahead * 1000.0) as u64));
        predicted
    }

    fn apply_current(&self, state: &mut KinematicState, seconds_ahead: f64) {
        let env = self.environment;
        if !env.consider_currents || env.current_speed <= MIN_CURRENT_SPEED_KN {
            return;
        }
        let drift_nm = env.current_speed * seconds_ahead / 3600.0;
        let drifted = project(state.position(), drift_nm, env.current_direction);
        state.lat = drifted.lat;
        state.lon = drifted.lon;
    }
}

fn predict_linear(state: &KinematicState, seconds_ahead: f64) -> KinematicState {
    let mut predicted = *state;
    if state.sog < MIN_MOVING_SPEED_KN {
        return predicted;
    }

    let distance_nm = state.sog * seconds_ahead / 3600.0;
    let position = project(state.position(), distance_nm, state.cog);
    predicted.lat = position.lat;
    predicted.lon = position.lon;
    predicted
}

fn predict_circular(state: &KinematicState, seconds_ahead: f64) -> KinematicState {
    if state.sog < MIN_MOVING_SPEED_KN {
        return predict_linear(state, seconds_ahead);
    }
    if turning_radius(state.sog, state.rot) < MIN_TURNING_RADIUS_NM {
        return predict_linear(state, seconds_ahead);
    }

    // Positive rot turns to starboard
    let course = normalize_degrees(state.cog + state.rot * seconds_ahead / 60.0);
    let distance_nm = state.sog * seconds_ahead / 3600.0;
    let position = project(state.position(), distance_nm, course);

    let mut predicted = *state;
    predicted.lat = position.lat;
    predicted.lon = position.lon;
    predicted.cog = course;
    predicted
}
