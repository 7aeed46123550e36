//! Collision Risk Assessment
//!
//! Motion state, prediction, classification and assessment of collision
//! risk between own ship and AIS targets.
//!
//! ## Components
//!
//! - **motion**: per-vessel kinematic state with trend tracking
//! - **predictor**: linear and turning-circle position prediction
//! - **classifier**: threshold ladder and collision probability
//! - **assessment**: multi-horizon CPA/TCPA search and guard zone entry
//! - **store**: current risk results and highest level
//! - **metrics**: assessment timing counters

mod assessment;
mod classifier;
mod metrics;
mod motion;
mod predictor;
mod store;
mod types;

pub use assessment::RiskAssessor;
pub use classifier::{classify, probability};
pub use metrics::MetricsRecorder;
pub use motion::{turning_radius, KinematicState, MIN_RATE_OF_TURN};
pub use predictor::PositionPredictor;
pub use store::RiskSet;
pub use types::*;
