//! CollisionRiskEngine - real-time collision risk orchestration
//!
//! Single entry point for the surrounding application. Update producers feed
//! own-ship, target, guard-zone and environment data in; a periodic driver
//! calls [`CollisionRiskEngine::on_fast_tick`] and
//! [`CollisionRiskEngine::on_cleanup_tick`]; risk events leave through the
//! [`EngineHost`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │           CollisionRiskEngine                                │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  data lock                                             │  │
//! │  │  ├─ own ship KinematicState                            │  │
//! │  │  ├─ targets HashMap<id, KinematicState>                │  │
//! │  │  ├─ guard zones, environment                           │  │
//! │  │  ├─ AssessmentQueue                                    │  │
//! │  │  └─ RiskSet (results + highest level)                  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │  config RwLock<Arc<..>>   metrics lock   scheduler lock      │
//! │  in-flight AtomicUsize                                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Assessments never run under a lock: inputs are copied out, assessed, and
//! written back under a fresh acquisition. Events are emitted after every
//! lock is released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use crate::error::RiskError;
use crate::guard_zones::GuardZone;
use crate::host::EngineHost;
use crate::navigation::distance_nm;
use crate::risk::{
    CollisionRiskResult, EnvironmentalConditions, KinematicState, MetricsRecorder,
    OwnShipUpdate, PerformanceMetrics, RiskAssessmentConfig, RiskAssessor, RiskEvent, RiskLevel,
    RiskSet, TargetUpdate,
};
use crate::scheduler::{AssessmentQueue, AssessmentScheduler, SchedulerState};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything guarded by the data lock
#[derive(Debug, Default)]
struct EngineData {
    own_ship: KinematicState,
    targets: HashMap<String, KinematicState>,
    guard_zones: Vec<GuardZone>,
    environment: EnvironmentalConditions,
    queue: AssessmentQueue,
    risks: RiskSet,
}

/// Counts one assessment as in flight for as long as it lives
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Events raised for one valid risk result
fn alerts_for(result: &CollisionRiskResult, events: &mut Vec<RiskEvent>) {
    events.push(RiskEvent::RiskDetected {
        result: result.clone(),
    });
    if result.risk_level >= RiskLevel::High {
        events.push(RiskEvent::HighRiskAlert {
            result: result.clone(),
        });
    }
    if result.risk_level >= RiskLevel::Critical {
        events.push(RiskEvent::CriticalRiskAlert {
            result: result.clone(),
        });
    }
}

/// Real-time collision risk engine
pub struct CollisionRiskEngine {
    host: Arc<dyn EngineHost>,
    config: RwLock<Arc<RiskAssessmentConfig>>,
    data: Mutex<EngineData>,
    metrics: Mutex<MetricsRecorder>,
    scheduler: Mutex<AssessmentScheduler>,
    in_flight: AtomicUsize,
}

impl CollisionRiskEngine {
    /// Create a stopped engine. The configuration is validated first.
    pub fn new(config: RiskAssessmentConfig, host: Arc<dyn EngineHost>) -> Result<Self, RiskError> {
        config.validate()?;
        let now = host.current_time_ms();
        Ok(CollisionRiskEngine {
            config: RwLock::new(Arc::new(config)),
            data: Mutex::new(EngineData::default()),
            metrics: Mutex::new(MetricsRecorder::new(now)),
            scheduler: Mutex::new(AssessmentScheduler::new()),
            in_flight: AtomicUsize::new(0),
            host,
        })
    }

    fn emit_all(&self, events: Vec<RiskEvent>) {
        for event in events {
            self.host.emit(event);
        }
    }

    fn performance_alert(&self, message: String) {
        self.host.info(&message);
        self.host.emit(RiskEvent::PerformanceAlert { message });
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start real-time monitoring. Returns false if already running.
    pub fn start(&self) -> bool {
        let started = lock(&self.scheduler).start();
        if started {
            let period = self.configuration().update_frequency_ms;
            self.performance_alert(format!(
                "Real-time collision risk monitoring started at {}ms intervals",
                period
            ));
        }
        started
    }

    /// Stop real-time monitoring. Returns false if already stopped.
    pub fn stop(&self) -> bool {
        let stopped = lock(&self.scheduler).stop();
        if stopped {
            self.performance_alert("Real-time collision risk monitoring stopped".to_string());
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        lock(&self.scheduler).is_running()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        lock(&self.scheduler).state()
    }

    /// Fast ticks processed since the last start
    pub fn tick_count(&self) -> u64 {
        lock(&self.scheduler).tick_count()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Snapshot of the current configuration
    pub fn configuration(&self) -> Arc<RiskAssessmentConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration atomically.
    ///
    /// An invalid configuration is rejected and the current one kept. The
    /// host driver is responsible for re-arming its timers.
    pub fn update_configuration(&self, config: RiskAssessmentConfig) -> Result<(), RiskError> {
        config.validate()?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        self.performance_alert("Collision risk configuration updated".to_string());
        Ok(())
    }

    // =========================================================================
    // Inbound Updates
    // =========================================================================

    /// Update own ship position and motion
    pub fn update_own_ship(&self, update: OwnShipUpdate) {
        let finite = [update.lat, update.lon, update.heading, update.sog, update.rot]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            self.host.debug("Ignoring own ship update with non-finite values");
            return;
        }
        let now = self.host.current_time_ms();
        lock(&self.data).own_ship.observe(
            update.lat,
            update.lon,
            update.heading,
            update.sog,
            update.rot,
            now,
        );
    }

    /// Update an AIS target.
    ///
    /// Returns false if the update was rejected (no position fix or
    /// non-finite motion). Targets close to own ship are queued for an
    /// immediate assessment.
    pub fn update_target(&self, target_id: &str, update: TargetUpdate) -> bool {
        if target_id.is_empty()
            || !update.has_position()
            || !update.cog.is_finite()
            || !update.sog.is_finite()
            || !update.rot.is_finite()
        {
            return false;
        }

        let config = self.configuration();
        let now = self.host.current_time_ms();
        let tracked = {
            let mut data = lock(&self.data);
            data.targets
                .entry(target_id.to_string())
                .or_default()
                .observe(update.lat, update.lon, update.cog, update.sog, update.rot, now);

            // Rough planar range gate in degrees
            if data.own_ship.is_valid() {
                let d_lat = data.own_ship.lat - update.lat;
                let d_lon = data.own_ship.lon - update.lon;
                if (d_lat * d_lat + d_lon * d_lon).sqrt() < config.immediate_assessment_range / 60.0 {
                    data.queue.push(target_id);
                }
            }
            data.targets.len()
        };

        lock(&self.metrics).set_tracked_targets(tracked);
        true
    }

    /// Replace the guard zone list
    pub fn update_guard_zones(&self, zones: Vec<GuardZone>) {
        lock(&self.data).guard_zones = zones;
    }

    pub fn update_environment(&self, environment: EnvironmentalConditions) {
        lock(&self.data).environment = environment;
    }

    /// Queue a target for assessment on the next fast tick.
    ///
    /// Returns false if it is already queued.
    pub fn enqueue_immediate(&self, target_id: &str) -> bool {
        lock(&self.data).queue.push(target_id)
    }

    // =========================================================================
    // Assessment
    // =========================================================================

    /// Assess one target now and merge the result into the current risks.
    ///
    /// Does nothing while stopped or when own ship or the target are unknown
    /// or invalid.
    pub fn perform_immediate_assessment(&self, target_id: &str) -> Option<CollisionRiskResult> {
        if !self.is_running() {
            return None;
        }

        let config = self.configuration();
        let (own_ship, target, environment) = {
            let data = lock(&self.data);
            let target = data.targets.get(target_id)?;
            if !data.own_ship.is_valid() {
                return None;
            }
            (data.own_ship, *target, data.environment.clone())
        };

        let now = self.host.current_time_ms();
        let (result, elapsed_ms) = {
            let _in_flight = InFlight::enter(&self.in_flight);
            let started = Instant::now();
            let result = RiskAssessor::new(&config, &environment)
                .assess_target(&own_ship, target_id, &target, now);
            (result, started.elapsed().as_secs_f64() * 1000.0)
        };

        lock(&self.metrics).record(elapsed_ms);

        let mut events = vec![RiskEvent::AssessmentCompleted {
            target_id: target_id.to_string(),
            duration_ms: elapsed_ms as u64,
        }];

        let result = result.map(|mut r| {
            r.calculation_time_ms = elapsed_ms as u64;
            r
        });

        let level_change = {
            let mut data = lock(&self.data);
            match &result {
                Some(r) => data.risks.upsert(r.clone()),
                None => data.risks.remove(target_id),
            }
        };

        if let Some(r) = &result {
            alerts_for(r, &mut events);
        }
        if let Some(level) = level_change {
            events.push(RiskEvent::RiskLevelChanged { level });
        }
        self.emit_all(events);
        result
    }

    /// Re-assess every relevant target and replace the current risk set.
    /// Results an immediate assessment stored after the sweep began are kept.
    ///
    /// Relevant targets are valid, fresher than the staleness window and
    /// within `max_relevant_range`. Returns the number of targets assessed,
    /// or `None` when stopped or without a valid own ship.
    pub fn perform_full_assessment(&self) -> Option<usize> {
        if !self.is_running() {
            return None;
        }

        let config = self.configuration();
        let now = self.host.current_time_ms();
        let (own_ship, targets, zones, environment) = {
            let data = lock(&self.data);
            if !data.own_ship.is_valid() {
                return None;
            }
            let own_position = data.own_ship.position();
            let mut targets: Vec<(String, KinematicState)> = data
                .targets
                .iter()
                .filter(|(_, t)| {
                    t.is_valid()
                        && !t.is_older_than(now, config.stale_target_age_sec)
                        && distance_nm(own_position, t.position()) <= config.max_relevant_range
                })
                .map(|(id, t)| (id.clone(), *t))
                .collect();
            targets.sort_by(|a, b| a.0.cmp(&b.0));
            let zones = if config.enable_guard_zone_assessment {
                data.guard_zones.clone()
            } else {
                Vec::new()
            };
            (data.own_ship, targets, zones, data.environment.clone())
        };

        let sweep_started = Instant::now();
        let assessor = RiskAssessor::new(&config, &environment);
        let mut events = Vec::new();
        let mut new_risks = Vec::new();

        for (target_id, target) in &targets {
            let _in_flight = InFlight::enter(&self.in_flight);
            let started = Instant::now();
            let result = assessor.assess_target(&own_ship, target_id, target, now);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            lock(&self.metrics).record(elapsed_ms);
            events.push(RiskEvent::AssessmentCompleted {
                target_id: target_id.clone(),
                duration_ms: elapsed_ms as u64,
            });

            if let Some(mut r) = result {
                r.calculation_time_ms = elapsed_ms as u64;
                new_risks.push(r);
            }
        }

        for zone in &zones {
            if let Some(r) = assessor.assess_guard_zone(&own_ship, zone, now) {
                new_risks.push(r);
            }
        }

        for r in &new_risks {
            alerts_for(r, &mut events);
        }

        let risk_count = new_risks.len();
        let level_change = lock(&self.data).risks.replace_all(new_risks, now);
        if let Some(level) = level_change {
            events.push(RiskEvent::RiskLevelChanged { level });
        }

        self.emit_all(events);
        let total_ms = sweep_started.elapsed().as_millis();
        self.host.debug(&format!(
            "Full assessment: {} targets, {} zones, {} risks",
            targets.len(),
            zones.len(),
            risk_count
        ));
        self.host.emit(RiskEvent::PerformanceAlert {
            message: format!(
                "Full assessment completed: {} targets in {}ms",
                targets.len(),
                total_ms
            ),
        });
        Some(targets.len())
    }

    /// Run a full sweep now instead of waiting for the scheduler
    pub fn force_assessment_update(&self) -> Option<usize> {
        self.perform_full_assessment()
    }

    // =========================================================================
    // Periodic Driver
    // =========================================================================

    /// Fast tick: drain queued immediate assessments within the concurrency
    /// budget, then run a full sweep when one is due.
    pub fn on_fast_tick(&self) {
        let config = self.configuration();
        let plan = lock(&self.scheduler).on_tick(
            config.ticks_per_full_sweep(),
            self.in_flight.load(Ordering::Acquire),
            config.max_concurrent_assessments,
        );

        if plan.immediate_budget > 0 {
            let queued = lock(&self.data).queue.take(plan.immediate_budget);
            for target_id in queued {
                self.perform_immediate_assessment(&target_id);
            }
        }

        if plan.full_sweep {
            self.perform_full_assessment();
        }
    }

    /// Cleanup tick: forget stale targets and fade old risk results
    pub fn on_cleanup_tick(&self) {
        let config = self.configuration();
        let now = self.host.current_time_ms();

        let (evicted, purged, tracked, level_change) = {
            let mut data = lock(&self.data);
            let before = data.targets.len();
            data.targets
                .retain(|_, t| !t.is_older_than(now, config.stale_target_age_sec));
            let evicted = before - data.targets.len();
            let (purged, level_change) = data.risks.purge_stale(now, config.risk_fade_time_sec);
            (evicted, purged, data.targets.len(), level_change)
        };

        lock(&self.metrics).set_tracked_targets(tracked);

        if evicted > 0 || purged > 0 {
            self.host.debug(&format!(
                "Cleanup removed {} stale targets and {} faded risks",
                evicted, purged
            ));
        }
        if let Some(level) = level_change {
            self.host.emit(RiskEvent::RiskLevelChanged { level });
        }
        self.host.emit(RiskEvent::PerformanceAlert {
            message: "Stale data cleanup completed".to_string(),
        });
    }

    // =========================================================================
    // Results & State
    // =========================================================================

    pub fn current_risks(&self) -> Vec<CollisionRiskResult> {
        lock(&self.data).risks.results().to_vec()
    }

    pub fn highest_risk_level(&self) -> RiskLevel {
        lock(&self.data).risks.highest()
    }

    /// Number of current risks at exactly `level`
    pub fn risk_count(&self, level: RiskLevel) -> usize {
        lock(&self.data).risks.count_at(level)
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let now = self.host.current_time_ms();
        lock(&self.metrics).snapshot(now)
    }

    pub fn reset_performance_metrics(&self) {
        let now = self.host.current_time_ms();
        lock(&self.metrics).reset(now);
    }

    /// Ids of all tracked targets, sorted
    pub fn tracked_targets(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.data).targets.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn target_state(&self, target_id: &str) -> Option<KinematicState> {
        lock(&self.data).targets.get(target_id).copied()
    }

    pub fn own_ship_state(&self) -> KinematicState {
        lock(&self.data).own_ship
    }

    pub fn guard_zones(&self) -> Vec<GuardZone> {
        lock(&self.data).guard_zones.clone()
    }

    pub fn environment(&self) -> EnvironmentalConditions {
        lock(&self.data).environment.clone()
    }

    /// Number of targets waiting for an immediate assessment
    pub fn queued_assessments(&self) -> usize {
        lock(&self.data).queue.len()
    }

    /// Number of assessments currently running
    pub fn active_assessments(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}
