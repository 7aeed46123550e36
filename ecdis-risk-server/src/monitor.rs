//! Server timer driver for the collision risk engine.
//!
//! The engine's scheduler is a pure state machine; this module owns the
//! clocks. A tokio task runs two intervals, a fast one that drains the
//! immediate queue and triggers full sweeps, and a slow one that evicts stale
//! data.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ RiskMonitor (this module)                          │
//! │  - start/stop the engine and the driver task       │
//! │  - publishes timer periods on a watch channel      │
//! └────────────────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌────────────────────────────────────────────────────┐
//! │ driver task                                        │
//! │  select! { cancel, fast tick, cleanup tick,        │
//! │            period change }                         │
//! └────────────────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌────────────────────────────────────────────────────┐
//! │ ecdis_risk_core::CollisionRiskEngine               │
//! │  on_fast_tick() / on_cleanup_tick()                │
//! └────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ecdis_risk_core::{CollisionRiskEngine, RiskAssessmentConfig, RiskError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;
use tokio_util::sync::CancellationToken;

use crate::ServerError;

/// Timer periods derived from the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPeriods {
    pub fast: Duration,
    pub cleanup: Duration,
}

impl TimerPeriods {
    pub fn from_config(config: &RiskAssessmentConfig) -> Self {
        Self {
            fast: Duration::from_millis(config.update_frequency_ms.max(1)),
            cleanup: Duration::from_millis(config.cleanup_interval_ms.max(1)),
        }
    }
}

struct Driver {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs the engine's periodic work on tokio intervals.
pub struct RiskMonitor {
    engine: Arc<CollisionRiskEngine>,
    periods_tx: watch::Sender<TimerPeriods>,
    driver: Mutex<Option<Driver>>,
}

impl RiskMonitor {
    pub fn new(engine: Arc<CollisionRiskEngine>) -> Self {
        let periods = TimerPeriods::from_config(&engine.configuration());
        let (periods_tx, _) = watch::channel(periods);
        Self {
            engine,
            periods_tx,
            driver: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<CollisionRiskEngine> {
        &self.engine
    }

    pub fn periods(&self) -> TimerPeriods {
        *self.periods_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start the engine and spawn the driver task.
    ///
    /// Must be called from within a tokio runtime. Returns false if already
    /// running.
    pub fn start(&self) -> bool {
        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if driver.is_some() {
            return false;
        }

        self.engine.start();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(drive(
            self.engine.clone(),
            self.periods_tx.subscribe(),
            cancel.clone(),
        ));
        *driver = Some(Driver { cancel, handle });
        log::info!("RiskMonitor: started");
        true
    }

    /// Stop the driver task and the engine. Returns false if not running.
    pub async fn stop(&self) -> bool {
        let driver = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(driver) = driver else {
            return false;
        };

        driver.cancel.cancel();
        if let Err(e) = driver.handle.await {
            log::warn!("RiskMonitor: driver task ended abnormally: {}", e);
        }
        self.engine.stop();
        log::info!("RiskMonitor: stopped");
        true
    }

    /// Replace the engine configuration and re-arm the timers.
    ///
    /// A running driver picks up the new periods without a stop/start.
    pub fn update_configuration(&self, config: RiskAssessmentConfig) -> Result<(), RiskError> {
        let periods = TimerPeriods::from_config(&config);
        self.engine.update_configuration(config)?;
        self.periods_tx.send_if_modified(|current| {
            if *current == periods {
                false
            } else {
                *current = periods;
                true
            }
        });
        Ok(())
    }

    /// Run as a tokio-graceful-shutdown subsystem.
    pub async fn run(self: Arc<Self>, subsys: SubsystemHandle) -> Result<(), ServerError> {
        log::info!("RiskMonitor: Starting monitor task");
        self.start();

        subsys.on_shutdown_requested().await;
        log::info!("RiskMonitor: Shutdown requested");

        self.stop().await;
        log::info!("RiskMonitor: Monitor task finished");
        Ok(())
    }
}

fn skipping_interval(period: Duration) -> Interval {
    // First tick one period from now, not immediately
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

async fn drive(
    engine: Arc<CollisionRiskEngine>,
    mut periods_rx: watch::Receiver<TimerPeriods>,
    cancel: CancellationToken,
) {
    let mut periods = *periods_rx.borrow_and_update();
    let mut fast = skipping_interval(periods.fast);
    let mut cleanup = skipping_interval(periods.cleanup);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            changed = periods_rx.changed() => {
                if changed.is_err() {
                    // Monitor dropped
                    break;
                }
                let new_periods = *periods_rx.borrow_and_update();
                if new_periods.fast != periods.fast {
                    fast = skipping_interval(new_periods.fast);
                }
                if new_periods.cleanup != periods.cleanup {
                    cleanup = skipping_interval(new_periods.cleanup);
                }
                log::debug!(
                    "RiskMonitor: timers re-armed, fast {:?}, cleanup {:?}",
                    new_periods.fast,
                    new_periods.cleanup
                );
                periods = new_periods;
            }
            _ = fast.tick() => {
                engine.on_fast_tick();
            }
            _ = cleanup.tick() => {
                engine.on_cleanup_tick();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokio_host::TokioHost;
    use ecdis_risk_core::{OwnShipUpdate, RiskEvent, TargetUpdate};

    fn monitor_with(config: RiskAssessmentConfig) -> (Arc<TokioHost>, Arc<RiskMonitor>) {
        let host = Arc::new(TokioHost::new());
        let engine = CollisionRiskEngine::new(config, host.clone()).unwrap();
        (host, Arc::new(RiskMonitor::new(Arc::new(engine))))
    }

    fn fast_config(update_frequency_ms: u64) -> RiskAssessmentConfig {
        RiskAssessmentConfig {
            update_frequency_ms,
            full_sweep_interval_ms: 1000,
            cleanup_interval_ms: 60_000,
            ..RiskAssessmentConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stop_idempotent() {
        let (_host, monitor) = monitor_with(fast_config(100));
        assert!(!monitor.is_running());

        assert!(monitor.start());
        assert!(!monitor.start());
        assert!(monitor.is_running());
        assert!(monitor.engine().is_running());

        assert!(monitor.stop().await);
        assert!(!monitor.stop().await);
        assert!(!monitor.is_running());
        assert!(!monitor.engine().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_ticks_follow_interval() {
        let (_host, monitor) = monitor_with(fast_config(100));
        monitor.start();

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let ticks = monitor.engine().tick_count();
        assert!((9..=11).contains(&ticks), "ticks = {}", ticks);

        monitor.stop().await;
        let stopped_at = monitor.engine().tick_count();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(monitor.engine().tick_count(), stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_change_rearms_fast_timer() {
        let (_host, monitor) = monitor_with(fast_config(100));
        monitor.start();

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let before = monitor.engine().tick_count();

        monitor.update_configuration(fast_config(500)).unwrap();
        assert_eq!(monitor.periods().fast, Duration::from_millis(500));
        assert!(monitor.is_running());

        tokio::time::sleep(Duration::from_millis(1050)).await;
        let delta = monitor.engine().tick_count() - before;
        assert!((1..=3).contains(&delta), "delta = {}", delta);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_keeps_timers() {
        let (_host, monitor) = monitor_with(fast_config(100));
        let bad = RiskAssessmentConfig {
            critical_distance: -1.0,
            update_frequency_ms: 500,
            ..RiskAssessmentConfig::default()
        };
        assert!(monitor.update_configuration(bad).is_err());
        assert_eq!(monitor.periods().fast, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_target_is_assessed_on_tick() {
        let (host, monitor) = monitor_with(fast_config(100));
        let mut events = host.subscribe();
        monitor.start();

        let engine = monitor.engine();
        engine.update_own_ship(OwnShipUpdate {
            lat: 0.0,
            lon: 1.0,
            heading: 90.0,
            sog: 10.0,
            rot: 0.0,
        });
        assert!(engine.update_target(
            "244123456",
            TargetUpdate {
                lat: 0.0,
                lon: 1.02,
                cog: 270.0,
                sog: 10.0,
                rot: 0.0,
            }
        ));
        assert_eq!(engine.queued_assessments(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(engine.queued_assessments(), 0);
        assert!(!engine.current_risks().is_empty());

        let mut completed = false;
        while let Ok(event) = events.try_recv() {
            if let RiskEvent::AssessmentCompleted { target_id, .. } = event {
                assert_eq!(target_id, "244123456");
                completed = true;
            }
        }
        assert!(completed);

        monitor.stop().await;
    }
}
