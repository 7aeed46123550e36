//! Error types for configuration handling
//!
//! Risk assessment itself never fails: invalid input is dropped and the
//! absence of a risk is a normal outcome. The only fallible operations are
//! replacing the configuration and decoding it from JSON.

use thiserror::Error;

/// Errors that can occur when loading or replacing a configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// A configuration field is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be decoded
    #[error("Cannot parse JSON: {0}")]
    ParseJson(String),
}

impl From<serde_json::Error> for RiskError {
    fn from(e: serde_json::Error) -> Self {
        RiskError::ParseJson(e.to_string())
    }
}
