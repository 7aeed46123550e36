//! Risk Type Definitions
//!
//! Configuration, inputs, results and events of the collision-risk engine.

use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::navigation::GeoPoint;

/// Risk level classification, ordered from safe to immediate danger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Safe
    None,
    /// Routine observation
    Low,
    /// Monitor closely
    Medium,
    /// Prepare for manoeuvre
    High,
    /// Immediate action
    Critical,
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::None
    }
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::None,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::None => write!(f, "None"),
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// Kind of object a risk result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    /// AIS-tracked vessel, threat id is the tracking key (MMSI)
    AisVessel,
    /// Guard zone the own-ship track is entering
    GuardZone,
}

impl Default for ThreatType {
    fn default() -> Self {
        ThreatType::AisVessel
    }
}

/// Configuration for risk assessment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskAssessmentConfig {
    /// CPA (NM) at or below which a risk is critical
    pub critical_distance: f64,
    pub high_risk_distance: f64,
    pub medium_risk_distance: f64,
    /// CPA (NM) beyond which there is no risk at all
    pub low_risk_distance: f64,

    /// TCPA (minutes) thresholds
    pub critical_time: f64,
    pub high_risk_time: f64,
    pub medium_risk_time: f64,
    pub low_risk_time: f64,

    /// Only targets within this range (NM) take part in a full sweep
    pub max_relevant_range: f64,
    /// Targets closer than this (NM) are queued for immediate assessment
    pub immediate_assessment_range: f64,
    /// Upper bound on assessments in flight at once
    pub max_concurrent_assessments: usize,
    /// Scheduler tick period in milliseconds (100 = 10 Hz)
    pub update_frequency_ms: u64,
    /// Interval between full sweeps in milliseconds
    pub full_sweep_interval_ms: u64,
    /// Interval between stale data cleanups in milliseconds
    pub cleanup_interval_ms: u64,
    /// Look-ahead horizon in minutes
    pub max_prediction_time: f64,

    pub enable_environmental_compensation: bool,
    pub enable_circular_motion_prediction: bool,
    pub enable_guard_zone_assessment: bool,
    /// Multiplier applied to the measured CPA and to the probability
    pub safety_margin: f64,

    /// Age (seconds) after which a risk result is purged
    pub risk_fade_time_sec: f64,
    /// Age (seconds) after which a target without updates is forgotten
    pub stale_target_age_sec: f64,
}

impl Default for RiskAssessmentConfig {
    fn default() -> Self {
        RiskAssessmentConfig {
            critical_distance: 0.1,    // 185 meters
            high_risk_distance: 0.25,  // 463 meters
            medium_risk_distance: 0.5, // 926 meters
            low_risk_distance: 1.0,    // 1852 meters
            critical_time: 2.0,
            high_risk_time: 5.0,
            medium_risk_time: 10.0,
            low_risk_time: 15.0,
            max_relevant_range: 10.0,
            immediate_assessment_range: 2.0,
            max_concurrent_assessments: 8,
            update_frequency_ms: 100,
            full_sweep_interval_ms: 10_000,
            cleanup_interval_ms: 5_000,
            max_prediction_time: 10.0,
            enable_environmental_compensation: true,
            enable_circular_motion_prediction: true,
            enable_guard_zone_assessment: true,
            safety_margin: 1.2,
            risk_fade_time_sec: 30.0,
            stale_target_age_sec: 30.0,
        }
    }
}

impl RiskAssessmentConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, RiskError> {
        let config: RiskAssessmentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of scheduler ticks between two full sweeps (at least one)
    pub fn ticks_per_full_sweep(&self) -> u64 {
        (self.full_sweep_interval_ms / self.update_frequency_ms.max(1)).max(1)
    }

    /// Check that the configuration can drive the engine
    pub fn validate(&self) -> Result<(), RiskError> {
        let positive = [
            ("criticalDistance", self.critical_distance),
            ("highRiskDistance", self.high_risk_distance),
            ("mediumRiskDistance", self.medium_risk_distance),
            ("lowRiskDistance", self.low_risk_distance),
            ("criticalTime", self.critical_time),
            ("highRiskTime", self.high_risk_time),
            ("mediumRiskTime", self.medium_risk_time),
            ("lowRiskTime", self.low_risk_time),
            ("maxRelevantRange", self.max_relevant_range),
            ("maxPredictionTime", self.max_prediction_time),
            ("safetyMargin", self.safety_margin),
            ("riskFadeTimeSec", self.risk_fade_time_sec),
            ("staleTargetAgeSec", self.stale_target_age_sec),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(RiskError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !self.immediate_assessment_range.is_finite() || self.immediate_assessment_range < 0.0 {
            return Err(RiskError::InvalidConfig(
                "immediateAssessmentRange must not be negative".to_string(),
            ));
        }
        if !(self.critical_distance <= self.high_risk_distance
            && self.high_risk_distance <= self.medium_risk_distance
            && self.medium_risk_distance <= self.low_risk_distance)
        {
            return Err(RiskError::InvalidConfig(
                "distance thresholds must increase from critical to low".to_string(),
            ));
        }
        if self.update_frequency_ms == 0 {
            return Err(RiskError::InvalidConfig(
                "updateFrequencyMs must be at least 1".to_string(),
            ));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(RiskError::InvalidConfig(
                "cleanupIntervalMs must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_assessments == 0 {
            return Err(RiskError::InvalidConfig(
                "maxConcurrentAssessments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Environmental conditions affecting collision prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentalConditions {
    pub consider_currents: bool,
    /// Current set speed in knots
    pub current_speed: f64,
    /// Direction the current flows towards, degrees
    pub current_direction: f64,
    pub consider_winds: bool,
    /// Wind speed in knots
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
    /// Water density in kg/m³
    pub water_density: f64,
}

impl Default for EnvironmentalConditions {
    fn default() -> Self {
        EnvironmentalConditions {
            consider_currents: true,
            current_speed: 0.0,
            current_direction: 0.0,
            consider_winds: false,
            wind_speed: 0.0,
            wind_direction: 0.0,
            water_density: 1025.0,
        }
    }
}

/// Own ship position report
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnShipUpdate {
    pub lat: f64,
    pub lon: f64,
    /// Heading in degrees, used as course
    pub heading: f64,
    /// Speed over ground in knots
    pub sog: f64,
    /// Rate of turn in degrees per minute
    #[serde(default)]
    pub rot: f64,
}

/// AIS target position report
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUpdate {
    pub lat: f64,
    pub lon: f64,
    /// Course over ground in degrees
    pub cog: f64,
    /// Speed over ground in knots
    pub sog: f64,
    /// Rate of turn in degrees per minute
    #[serde(default)]
    pub rot: f64,
}

impl TargetUpdate {
    /// AIS reports 0/0 when no fix is available
    pub fn has_position(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && !(self.lat == 0.0 && self.lon == 0.0)
    }
}

/// Collision risk assessment result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionRiskResult {
    pub risk_level: RiskLevel,
    /// 0.0 - 1.0
    pub collision_probability: f64,
    /// TCPA in minutes
    pub time_to_collision: f64,
    /// CPA in nautical miles
    pub min_distance: f64,
    /// Predicted position of the threat at the closest approach
    pub collision_point: GeoPoint,
    /// MMSI for AIS targets, `zone-<id>` for guard zones
    pub threat_id: String,
    pub threat_type: ThreatType,
    /// Unix timestamp (ms) of the predicted closest approach
    pub predicted_collision_time: u64,
    /// Knots
    pub threat_speed: f64,
    /// Degrees
    pub threat_course: f64,
    /// Knots
    pub relative_speed: f64,
    /// Degrees relative to own course (0-360)
    pub relative_bearing: f64,
    /// How long this calculation took
    pub calculation_time_ms: u64,
    /// Unix timestamp (ms) when this risk was calculated
    pub calculation_timestamp: u64,
}

impl CollisionRiskResult {
    pub fn is_valid(&self) -> bool {
        !self.threat_id.is_empty()
            && self.risk_level > RiskLevel::None
            && self.time_to_collision.is_finite()
            && self.time_to_collision >= 0.0
    }

    /// Check whether the result is older than `max_age_sec` at `now` (ms)
    pub fn is_stale(&self, now: u64, max_age_sec: f64) -> bool {
        let age_ms = now.saturating_sub(self.calculation_timestamp);
        age_ms as f64 / 1000.0 > max_age_sec
    }
}

/// Running performance counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub average_assessment_time_ms: f64,
    pub max_assessment_time_ms: f64,
    pub total_assessments_performed: u64,
    pub active_targets_being_tracked: usize,
    pub uptime_seconds: u64,
    /// Not measured, always 0
    pub cpu_usage_percentage: f64,
}

/// Events emitted by the risk engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskEvent {
    /// A valid risk was found for a threat
    RiskDetected { result: CollisionRiskResult },
    /// Risk at or above High
    HighRiskAlert { result: CollisionRiskResult },
    /// Risk at Critical
    CriticalRiskAlert { result: CollisionRiskResult },
    /// The highest active risk level changed
    RiskLevelChanged { level: RiskLevel },
    /// An assessment for one target finished
    AssessmentCompleted { target_id: String, duration_ms: u64 },
    /// Free-text diagnostic
    PerformanceAlert { message: String },
}
