//! Tokio implementation of EngineHost for the native server.
//!
//! This module provides `TokioHost` which implements
//! `ecdis_risk_core::EngineHost`: the wall clock comes from `chrono`, core
//! log lines go through the `log` crate, and risk events are published on a
//! `tokio::sync::broadcast` channel that any number of tasks can subscribe to.

use chrono::Utc;
use ecdis_risk_core::{EngineHost, RiskEvent, RiskLevel};
use tokio::sync::broadcast;

/// Events kept for slow subscribers before they start lagging
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Tokio implementation of EngineHost.
///
/// # Usage
///
/// ```rust,ignore
/// use ecdis_risk_server::tokio_host::TokioHost;
///
/// let host = Arc::new(TokioHost::new());
/// let mut events = host.subscribe();
/// let engine = CollisionRiskEngine::new(config, host.clone())?;
///
/// while let Ok(event) = events.recv().await {
///     println!("{:?}", event);
/// }
/// ```
pub struct TokioHost {
    event_tx: broadcast::Sender<RiskEvent>,
}

impl TokioHost {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    /// Subscribe to risk events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RiskEvent> {
        self.event_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.event_tx.receiver_count()
    }
}

impl Default for TokioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHost for TokioHost {
    fn current_time_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }

    fn emit(&self, event: RiskEvent) {
        match &event {
            RiskEvent::CriticalRiskAlert { result } => {
                log::warn!(
                    "CRITICAL collision risk: {} CPA {:.2} nm in {:.1} min",
                    result.threat_id,
                    result.min_distance,
                    result.time_to_collision
                );
            }
            RiskEvent::HighRiskAlert { result } if result.risk_level == RiskLevel::High => {
                log::warn!(
                    "High collision risk: {} CPA {:.2} nm in {:.1} min",
                    result.threat_id,
                    result.min_distance,
                    result.time_to_collision
                );
            }
            RiskEvent::RiskLevelChanged { level } => {
                log::info!("Highest risk level now {}", level);
            }
            RiskEvent::PerformanceAlert { message } => {
                log::debug!("{}", message);
            }
            _ => {}
        }

        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }

    fn debug(&self, msg: &str) {
        log::debug!("{}", msg);
    }

    fn info(&self, msg: &str) {
        log::info!("{}", msg);
    }
}
