//! # ECDIS Risk Core
//!
//! Platform-independent real-time collision risk assessment for ECDIS
//! bridge systems: own ship against AIS targets and guard zones.
//!
//! This crate contains the pure assessment logic with **zero I/O
//! dependencies**. Clock, logging and event delivery are abstracted through
//! the [`EngineHost`] trait, and the periodic timers live in the host.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ecdis-risk-core (platform-independent, no tokio/async)     │
//! │  ├── navigation/   (rhumbline geodesy, CPA/TCPA)            │
//! │  ├── risk/         (motion, prediction, classification)     │
//! │  ├── guard_zones/  (circle and polygon zones)               │
//! │  ├── scheduler     (start/stop state machine, tick plan)    │
//! │  ├── engine/       (CollisionRiskEngine orchestration)      │
//! │  └── EngineHost    (abstracts clock, logging, events)       │
//! └─────────────────────────────────────────────────────────────┘
//!                 ▲
//!    ┌────────────┴────────────┐
//!    │  ecdis-risk-server      │
//!    │  (TokioHost, timers)    │
//!    └─────────────────────────┘
//! ```
//!
//! ## Key Modules
//!
//! - [`navigation`] - Geodesy and the CPA/TCPA primitive
//! - [`risk`] - Kinematic state, predictor, classifier, assessment, results
//! - [`guard_zones`] - Geographic guard zones
//! - [`scheduler`] - Scheduler state machine and immediate queue
//! - [`engine`] - [`CollisionRiskEngine`], the single entry point
//! - [`host`] - Platform trait ([`EngineHost`])
//!
//! ## Example: Head-on Encounter
//!
//! ```rust
//! use std::sync::Arc;
//! use ecdis_risk_core::{
//!     CollisionRiskEngine, EngineHost, OwnShipUpdate, RiskAssessmentConfig, RiskEvent,
//!     RiskLevel, TargetUpdate,
//! };
//!
//! struct QuietHost;
//!
//! impl EngineHost for QuietHost {
//!     fn current_time_ms(&self) -> u64 {
//!         1_700_000_000_000
//!     }
//!     fn emit(&self, _event: RiskEvent) {}
//!     fn debug(&self, _msg: &str) {}
//!     fn info(&self, _msg: &str) {}
//! }
//!
//! let engine = CollisionRiskEngine::new(RiskAssessmentConfig::default(), Arc::new(QuietHost))?;
//! engine.start();
//! engine.update_own_ship(OwnShipUpdate { lat: 0.0, lon: 1.0, heading: 90.0, sog: 10.0, rot: 0.0 });
//! engine.update_target("244123456", TargetUpdate { lat: 0.0, lon: 1.2, cog: 270.0, sog: 10.0, rot: 0.0 });
//!
//! let result = engine.perform_immediate_assessment("244123456").expect("closing target");
//! assert!(result.risk_level >= RiskLevel::Medium);
//! # Ok::<(), ecdis_risk_core::RiskError>(())
//! ```

pub mod engine;
pub mod error;
pub mod guard_zones;
pub mod host;
pub mod navigation;
pub mod risk;
pub mod scheduler;

// Re-export commonly used types
pub use engine::CollisionRiskEngine;
pub use error::RiskError;
pub use guard_zones::{GuardZone, ZoneShape};
pub use host::EngineHost;
pub use navigation::{calculate_cpa_tcpa, CpaResult, CpaStatus, GeoPoint, VesselState};
pub use risk::{
    CollisionRiskResult, EnvironmentalConditions, KinematicState, OwnShipUpdate,
    PerformanceMetrics, RiskAssessmentConfig, RiskEvent, RiskLevel, TargetUpdate, ThreatType,
};
pub use scheduler::{AssessmentScheduler, SchedulerState};
