//! Configuration file handling.
//!
//! The assessment configuration is a JSON document with camelCase keys.
//! Missing keys take their default value, so a file holding only
//! `{"criticalDistance": 0.3}` is valid.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use ecdis_risk_core::RiskAssessmentConfig;
use log::{debug, info};

use crate::ServerError;

pub const CONFIG_FILE_NAME: &str = "risk-config.json";

pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ecdis", "ecdis-risk")
}

/// `risk-config.json` inside the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    get_project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one the default path is tried and
/// a missing file there yields [`RiskAssessmentConfig::default`].
pub fn load_config(path: Option<&Path>) -> Result<RiskAssessmentConfig, ServerError> {
    match path {
        Some(path) => load_config_file(path),
        None => match default_config_path() {
            Some(path) if path.exists() => load_config_file(&path),
            Some(path) => {
                info!(
                    "No configuration at {}, using defaults",
                    path.display()
                );
                Ok(RiskAssessmentConfig::default())
            }
            None => {
                info!("No configuration directory, using defaults");
                Ok(RiskAssessmentConfig::default())
            }
        },
    }
}

pub fn load_config_file(path: &Path) -> Result<RiskAssessmentConfig, ServerError> {
    let json = fs::read_to_string(path).map_err(|source| ServerError::Io {
        path: path.to_owned(),
        source,
    })?;
    let config = RiskAssessmentConfig::from_json(&json).map_err(|source| ServerError::Config {
        path: path.to_owned(),
        source,
    })?;
    info!("Loaded configuration from {}", path.display());
    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Write `config` as pretty JSON, creating parent directories as needed
pub fn save_config(path: &Path, config: &RiskAssessmentConfig) -> Result<(), ServerError> {
    let io_err = |source: std::io::Error| ServerError::Io {
        path: path.to_owned(),
        source,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let file = fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, config).map_err(|e| io_err(e.into()))?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    info!("Stored configuration -> {}", path.display());
    Ok(())
}
