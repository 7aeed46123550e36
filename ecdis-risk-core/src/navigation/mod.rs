//! Navigation primitives
//!
//! Leaf building blocks used by the risk engine:
//!
//! - **geodesy**: rhumbline projection, distance and bearing
//! - **cpa**: CPA/TCPA between two vessels with a convergence status

mod cpa;
mod geodesy;

pub use cpa::{calculate_cpa_tcpa, CpaResult, CpaStatus, VesselState};
pub use geodesy::{
    bearing_deg, distance_and_bearing, distance_nm, normalize_degrees, normalize_delta, project,
    GeoPoint, EARTH_RADIUS_NM, NM_PER_DEGREE,
};
