//! Assessment scheduler state machine.
//!
//! Platform-independent bookkeeping for the real-time assessment loop. The
//! timers themselves live in the host (a tokio task on the server); on each
//! fast tick the host asks the scheduler what to do and the engine does it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  fast tick   ┌─────────────────────────┐
//! │ host timer driver    │ ───────────▶ │ AssessmentScheduler     │
//! │ (tokio interval)     │              │ - Stopped / Running     │
//! └──────────────────────┘              │ - tick counter          │
//!                                       │ - returns a TickPlan    │
//!                                       └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use ecdis_risk_core::scheduler::{AssessmentScheduler, SchedulerState};
//!
//! let mut scheduler = AssessmentScheduler::new();
//! assert!(scheduler.start());
//! assert!(!scheduler.start()); // already running
//!
//! // Two assessments in flight, budget of eight, sweep every 100 ticks
//! let plan = scheduler.on_tick(100, 2, 8);
//! assert_eq!(plan.immediate_budget, 6);
//! assert!(!plan.full_sweep);
//!
//! scheduler.stop();
//! assert_eq!(scheduler.state(), SchedulerState::Stopped);
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// =============================================================================
// Scheduler State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// No ticks are processed
    Stopped,
    /// Ticks drain the immediate queue and trigger full sweeps
    Running,
}

impl Default for SchedulerState {
    fn default() -> Self {
        SchedulerState::Stopped
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Stopped => write!(f, "Stopped"),
            SchedulerState::Running => write!(f, "Running"),
        }
    }
}

/// Work to do on one fast tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickPlan {
    /// Maximum number of queued targets to assess now
    pub immediate_budget: usize,
    /// Whether a full sweep follows the queued assessments
    pub full_sweep: bool,
}

// =============================================================================
// Scheduler
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct AssessmentScheduler {
    state: SchedulerState,
    /// Fast ticks processed since the last start
    tick_count: u64,
}

impl AssessmentScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // -------------------------------------------------------------------------
    // State Transitions
    // -------------------------------------------------------------------------

    /// Transition to running. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = SchedulerState::Running;
        self.tick_count = 0;
        true
    }

    /// Transition to stopped. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = SchedulerState::Stopped;
        true
    }

    /// Account for one fast tick and plan its work.
    ///
    /// # Arguments
    ///
    /// * `ticks_per_sweep` - Fast ticks between two full sweeps (at least 1)
    /// * `in_flight` - Assessments currently running
    /// * `max_concurrent` - Upper bound on assessments in flight
    pub fn on_tick(&mut self, ticks_per_sweep: u64, in_flight: usize, max_concurrent: usize) -> TickPlan {
        if !self.is_running() {
            return TickPlan::default();
        }

        self.tick_count += 1;
        TickPlan {
            immediate_budget: max_concurrent.saturating_sub(in_flight),
            full_sweep: self.tick_count % ticks_per_sweep.max(1) == 0,
        }
    }
}

// =============================================================================
// Immediate Queue
// =============================================================================

/// FIFO of target ids waiting for an immediate assessment, each id at most once
#[derive(Debug, Clone, Default)]
pub struct AssessmentQueue {
    ids: VecDeque<String>,
}

impl AssessmentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id unless it is already queued. Returns true if appended.
    pub fn push(&mut self, id: &str) -> bool {
        if self.ids.iter().any(|queued| queued == id) {
            return false;
        }
        self.ids.push_back(id.to_string());
        true
    }

    /// Take up to `max` ids from the front of the queue
    pub fn take(&mut self, max: usize) -> Vec<String> {
        let n = max.min(self.ids.len());
        self.ids.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
