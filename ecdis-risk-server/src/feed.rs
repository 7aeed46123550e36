//! JSON-lines update feed.
//!
//! Each line is one message tagged by `type`:
//!
//! ```text
//! {"type":"own_ship","lat":52.0,"lon":4.0,"heading":90.0,"sog":12.0}
//! {"type":"target","id":"244123456","lat":52.0,"lon":4.1,"cog":270.0,"sog":10.0}
//! {"type":"environment","currentSpeed":0.8,"currentDirection":45.0}
//! {"type":"guard_zones","zones":[{"id":1,"shape":{"type":"circle","center":{"lat":52.0,"lon":4.0},"radiusNm":1.0}}]}
//! {"type":"config","criticalDistance":0.3}
//! {"type":"assess","id":"244123456"}
//! {"type":"assess"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Malformed lines are
//! logged and skipped; the feed keeps going.

use std::path::Path;
use std::sync::Arc;

use ecdis_risk_core::{
    EnvironmentalConditions, GuardZone, OwnShipUpdate, RiskAssessmentConfig, RiskError,
    TargetUpdate,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_graceful_shutdown::SubsystemHandle;

use crate::monitor::RiskMonitor;
use crate::ServerError;

/// Source name that selects stdin
pub const STDIN: &str = "-";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    OwnShip(OwnShipUpdate),
    Target {
        id: String,
        lat: f64,
        lon: f64,
        cog: f64,
        sog: f64,
        #[serde(default)]
        rot: f64,
    },
    Environment(EnvironmentalConditions),
    GuardZones {
        zones: Vec<GuardZone>,
    },
    Config(RiskAssessmentConfig),
    /// Queue one target, or run a full sweep when `id` is absent
    Assess {
        #[serde(default)]
        id: Option<String>,
    },
}

/// Parse one feed line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<FeedMessage>, RiskError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Apply one message to the monitored engine.
pub fn apply(message: FeedMessage, monitor: &RiskMonitor) -> Result<(), RiskError> {
    let engine = monitor.engine();
    match message {
        FeedMessage::OwnShip(update) => engine.update_own_ship(update),
        FeedMessage::Target {
            id,
            lat,
            lon,
            cog,
            sog,
            rot,
        } => {
            let accepted = engine.update_target(
                &id,
                TargetUpdate {
                    lat,
                    lon,
                    cog,
                    sog,
                    rot,
                },
            );
            if !accepted {
                log::debug!("Feed: rejected update for target {}", id);
            }
        }
        FeedMessage::Environment(environment) => engine.update_environment(environment),
        FeedMessage::GuardZones { zones } => {
            log::debug!("Feed: {} guard zones", zones.len());
            engine.update_guard_zones(zones);
        }
        FeedMessage::Config(config) => monitor.update_configuration(config)?,
        FeedMessage::Assess { id: Some(id) } => {
            engine.enqueue_immediate(&id);
        }
        FeedMessage::Assess { id: None } => {
            engine.force_assessment_update();
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Read messages until end of input, applying each in order.
pub async fn read_feed<R>(reader: R, monitor: &RiskMonitor) -> Result<FeedStats, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let result = parse_line(&line).and_then(|message| match message {
            Some(message) => apply(message, monitor).map(|_| true),
            None => Ok(false),
        });
        match result {
            Ok(true) => stats.applied += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("Feed: skipping line {}: {}", line_no, e);
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}

async fn open(source: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, ServerError> {
    if source == STDIN {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let path = Path::new(source);
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ServerError::Io {
            path: path.to_owned(),
            source,
        })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Run the feed as a tokio-graceful-shutdown subsystem.
///
/// With `exit_on_eof` the whole program shuts down when the feed ends;
/// otherwise the monitor keeps running on the last known picture.
pub async fn run(
    source: String,
    monitor: Arc<RiskMonitor>,
    exit_on_eof: bool,
    subsys: SubsystemHandle,
) -> Result<(), ServerError> {
    let reader = open(&source).await?;
    log::info!("Feed: reading updates from {}", display_name(&source));

    tokio::select! {
        _ = subsys.on_shutdown_requested() => {
            log::info!("Feed: Shutdown requested");
            return Ok(());
        }
        stats = read_feed(reader, &monitor) => {
            let stats = stats?;
            log::info!(
                "Feed: end of input, {} messages applied, {} skipped",
                stats.applied,
                stats.skipped
            );
        }
    }

    if exit_on_eof {
        subsys.request_shutdown();
    } else {
        subsys.on_shutdown_requested().await;
    }
    Ok(())
}

fn display_name(source: &str) -> &str {
    if source == STDIN {
        "stdin"
    } else {
        source
    }
}
