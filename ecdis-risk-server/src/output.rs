//! Risk event output as JSON lines.
//!
//! Each event is written as one line with a UTC timestamp added:
//!
//! ```text
//! {"time":"2026-03-01T12:00:00.120Z","type":"risk_level_changed","level":"high"}
//! ```

use chrono::{DateTime, Utc};
use ecdis_risk_core::RiskEvent;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::ServerError;

#[derive(Serialize)]
struct OutputLine<'a> {
    time: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a RiskEvent,
}

/// Serialize one event to a JSON line (including the newline)
pub fn format_event(event: &RiskEvent, time: DateTime<Utc>) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(&OutputLine { time, event })?;
    line.push('\n');
    Ok(line)
}

/// Copy events to `writer` until the channel closes. Returns the number of
/// events written.
pub async fn forward_events<W>(
    events: &mut broadcast::Receiver<RiskEvent>,
    writer: &mut W,
) -> Result<u64, ServerError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    loop {
        match events.recv().await {
            Ok(event) => match format_event(&event, Utc::now()) {
                Ok(line) => {
                    writer.write_all(line.as_bytes()).await?;
                    writer.flush().await?;
                    written += 1;
                }
                Err(e) => log::error!("Output: cannot serialize {:?}: {}", event, e),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("Output: fell behind, {} events dropped", n);
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(written),
        }
    }
}

/// Run the stdout writer as a tokio-graceful-shutdown subsystem.
pub async fn run(
    mut events: broadcast::Receiver<RiskEvent>,
    subsys: SubsystemHandle,
) -> Result<(), ServerError> {
    let mut stdout = tokio::io::stdout();
    tokio::select! {
        _ = subsys.on_shutdown_requested() => {
            log::debug!("Output: Shutdown requested");
        }
        result = forward_events(&mut events, &mut stdout) => {
            let written = result?;
            log::debug!("Output: event channel closed after {} events", written);
        }
    }
    Ok(())
}
