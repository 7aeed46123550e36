//! Risk Classification
//!
//! Maps a (CPA, TCPA, relative speed) triple to a [`RiskLevel`] and a
//! collision probability using the configured thresholds.

use super::types::{RiskAssessmentConfig, RiskLevel};

/// Relative speed (knots) at which the speed factor saturates
const SATURATION_SPEED_KN: f64 = 20.0;

/// Classify a risk from CPA (NM) and TCPA (minutes).
///
/// The CPA is divided by the safety margin before the threshold ladder is
/// applied, so a larger margin makes the classification more conservative.
/// Outside the critical distance nothing rates above None once the TCPA
/// exceeds `low_risk_time`.
pub fn classify(
    config: &RiskAssessmentConfig,
    cpa: f64,
    tcpa: f64,
    _relative_speed: f64,
) -> RiskLevel {
    let adjusted_cpa = cpa / config.safety_margin;

    if adjusted_cpa <= config.critical_distance {
        if tcpa <= config.critical_time {
            RiskLevel::Critical
        } else if tcpa <= config.high_risk_time {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    } else if adjusted_cpa <= config.high_risk_distance {
        if tcpa <= config.high_risk_time {
            RiskLevel::High
        } else if tcpa <= config.medium_risk_time {
            RiskLevel::Medium
        } else {
            low_within_time(config, tcpa)
        }
    } else if adjusted_cpa <= config.medium_risk_distance {
        if tcpa <= config.medium_risk_time {
            RiskLevel::Medium
        } else {
            low_within_time(config, tcpa)
        }
    } else if adjusted_cpa <= config.low_risk_distance {
        low_within_time(config, tcpa)
    } else {
        RiskLevel::None
    }
}

fn low_within_time(config: &RiskAssessmentConfig, tcpa: f64) -> RiskLevel {
    if tcpa <= config.low_risk_time {
        RiskLevel::Low
    } else {
        RiskLevel::None
    }
}

/// Collision probability in the range 0.0 - 1.0
pub fn probability(config: &RiskAssessmentConfig, cpa: f64, tcpa: f64, relative_speed: f64) -> f64 {
    if cpa <= 0.0 || tcpa <= 0.0 {
        return 1.0;
    }

    let distance_factor = (-cpa / config.critical_distance).exp();
    let time_factor = (-tcpa / config.critical_time).exp();
    let speed_factor = (relative_speed / SATURATION_SPEED_KN).min(1.0);

    let p = distance_factor * time_factor * speed_factor * config.safety_margin;
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        let config = RiskAssessmentConfig::default();
        assert_eq!(classify(&config, 0.05, 1.0, 10.0), RiskLevel::Critical);
        assert_eq!(classify(&config, 0.8, 20.0, 5.0), RiskLevel::None);
    }

    #[test]
    fn test_classify_ladder() {
        let config = RiskAssessmentConfig::default();
        // 0.1 / 1.2 is inside the critical distance
        assert_eq!(classify(&config, 0.1, 4.0, 0.0), RiskLevel::High);
        assert_eq!(classify(&config, 0.1, 30.0, 0.0), RiskLevel::Medium);
        assert_eq!(classify(&config, 0.25, 4.0, 0.0), RiskLevel::High);
        assert_eq!(classify(&config, 0.25, 12.0, 0.0), RiskLevel::Low);
        assert_eq!(classify(&config, 0.5, 8.0, 0.0), RiskLevel::Medium);
        assert_eq!(classify(&config, 1.1, 0.5, 0.0), RiskLevel::Low);
        assert_eq!(classify(&config, 1.3, 0.5, 0.0), RiskLevel::None);
    }

    #[test]
    fn test_low_risk_time_bounds_low() {
        let config = RiskAssessmentConfig::default();
        assert_eq!(classify(&config, 0.8, 15.0, 5.0), RiskLevel::Low);
        assert_eq!(classify(&config, 0.8, 15.1, 5.0), RiskLevel::None);
        assert_eq!(classify(&config, 0.5, 14.0, 5.0), RiskLevel::Low);
        assert_eq!(classify(&config, 0.5, 16.0, 5.0), RiskLevel::None);
        assert_eq!(classify(&config, 0.25, 16.0, 5.0), RiskLevel::None);
        // Inside the critical distance a distant TCPA is still Medium
        assert_eq!(classify(&config, 0.05, 30.0, 5.0), RiskLevel::Medium);

        let patient = RiskAssessmentConfig {
            low_risk_time: 30.0,
            ..RiskAssessmentConfig::default()
        };
        assert_eq!(classify(&patient, 0.8, 20.0, 5.0), RiskLevel::Low);
    }

    #[test]
    fn test_classify_monotonic_in_cpa() {
        let config = RiskAssessmentConfig::default();
        for tcpa in [0.0, 1.0, 2.0, 3.5, 5.0, 7.0, 10.0, 14.0, 30.0] {
            let mut previous = RiskLevel::Critical;
            for step in 0..=200 {
                let cpa = step as f64 * 0.01;
                let level = classify(&config, cpa, tcpa, 10.0);
                assert!(
                    level <= previous,
                    "risk rose from {} to {} at cpa {} tcpa {}",
                    previous,
                    level,
                    cpa,
                    tcpa
                );
                previous = level;
            }
        }
    }

    #[test]
    fn test_classify_monotonic_in_tcpa() {
        let config = RiskAssessmentConfig::default();
        for cpa in [0.0, 0.05, 0.12, 0.2, 0.3, 0.45, 0.6, 0.9, 1.5] {
            let mut previous = RiskLevel::Critical;
            for step in 0..=300 {
                let tcpa = step as f64 * 0.1;
                let level = classify(&config, cpa, tcpa, 10.0);
                assert!(level <= previous, "risk rose at cpa {} tcpa {}", cpa, tcpa);
                previous = level;
            }
        }
    }

    #[test]
    fn test_probability_certain_collision() {
        let config = RiskAssessmentConfig::default();
        assert_eq!(probability(&config, 0.0, 5.0, 10.0), 1.0);
        assert_eq!(probability(&config, 0.3, 0.0, 10.0), 1.0);
    }

    #[test]
    fn test_probability_bounds() {
        let config = RiskAssessmentConfig {
            safety_margin: 50.0,
            ..Default::default()
        };
        for cpa in [0.001, 0.01, 0.1, 1.0, 10.0] {
            for tcpa in [0.001, 0.5, 2.0, 10.0, 100.0] {
                for speed in [0.0, 5.0, 20.0, 40.0] {
                    let p = probability(&config, cpa, tcpa, speed);
                    assert!((0.0..=1.0).contains(&p), "p={} out of range", p);
                }
            }
        }
    }

    #[test]
    fn test_probability_decreases_with_cpa() {
        let config = RiskAssessmentConfig::default();
        let mut previous = f64::INFINITY;
        for step in 1..=20 {
            let p = probability(&config, step as f64 * 0.05, 1.0, 15.0);
            assert!(p < previous);
            previous = p;
        }
    }

    #[test]
    fn test_probability_without_relative_motion() {
        let config = RiskAssessmentConfig::default();
        assert_eq!(probability(&config, 0.2, 3.0, 0.0), 0.0);
    }
}
