//! Assessment performance counters

use super::types::PerformanceMetrics;

/// Incrementally maintained [`PerformanceMetrics`]
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    metrics: PerformanceMetrics,
    /// Unix timestamp (ms) uptime is measured from
    started_at: u64,
}

impl MetricsRecorder {
    pub fn new(now: u64) -> Self {
        MetricsRecorder {
            metrics: PerformanceMetrics::default(),
            started_at: now,
        }
    }

    /// Record the duration of one completed assessment
    pub fn record(&mut self, sample_ms: f64) {
        let m = &mut self.metrics;
        m.total_assessments_performed += 1;
        let n = m.total_assessments_performed as f64;
        m.average_assessment_time_ms = (m.average_assessment_time_ms * (n - 1.0) + sample_ms) / n;
        m.max_assessment_time_ms = m.max_assessment_time_ms.max(sample_ms);
    }

    pub fn set_tracked_targets(&mut self, count: usize) {
        self.metrics.active_targets_being_tracked = count;
    }

    /// Snapshot with the uptime computed at `now`
    pub fn snapshot(&self, now: u64) -> PerformanceMetrics {
        PerformanceMetrics {
            uptime_seconds: now.saturating_sub(self.started_at) / 1000,
            ..self.metrics
        }
    }

    /// Zero all counters and restart uptime, keeping the tracked-target count
    pub fn reset(&mut self, now: u64) {
        let tracked = self.metrics.active_targets_being_tracked;
        self.metrics = PerformanceMetrics {
            active_targets_being_tracked: tracked,
            ..Default::default()
        };
        self.started_at = now;
    }
}
