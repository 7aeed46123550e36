//! Current risk results
//!
//! Holds at most one result per threat id together with the highest active
//! risk level. Every mutation reports whether that level changed so the
//! caller can emit a level-change event after releasing its lock.

use super::types::{CollisionRiskResult, RiskLevel};

#[derive(Debug, Clone, Default)]
pub struct RiskSet {
    results: Vec<CollisionRiskResult>,
    highest: RiskLevel,
}

impl RiskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a result, replacing any earlier result for the same threat.
    ///
    /// Returns the new highest level if it changed.
    pub fn upsert(&mut self, result: CollisionRiskResult) -> Option<RiskLevel> {
        match self
            .results
            .iter_mut()
            .find(|r| r.threat_id == result.threat_id)
        {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
        self.recompute()
    }

    /// Drop the result for one threat, if any
    pub fn remove(&mut self, threat_id: &str) -> Option<RiskLevel> {
        self.results.retain(|r| r.threat_id != threat_id);
        self.recompute()
    }

    /// Replace the whole set with the results of a sweep that started at
    /// `sweep_time`.
    ///
    /// Results stamped after `sweep_time` were written while the sweep ran
    /// and win over the sweep's result for the same threat.
    pub fn replace_all(
        &mut self,
        results: Vec<CollisionRiskResult>,
        sweep_time: u64,
    ) -> Option<RiskLevel> {
        let newer: Vec<CollisionRiskResult> = self
            .results
            .drain(..)
            .filter(|r| r.calculation_timestamp > sweep_time)
            .collect();
        self.results = results
            .into_iter()
            .filter(|r| !newer.iter().any(|n| n.threat_id == r.threat_id))
            .collect();
        self.results.extend(newer);
        self.recompute()
    }

    /// Remove results older than `fade_time_sec`, returns the count removed
    /// and the new highest level if it changed
    pub fn purge_stale(&mut self, now: u64, fade_time_sec: f64) -> (usize, Option<RiskLevel>) {
        let before = self.results.len();
        self.results.retain(|r| !r.is_stale(now, fade_time_sec));
        let removed = before - self.results.len();
        (removed, self.recompute())
    }

    fn recompute(&mut self) -> Option<RiskLevel> {
        let highest = self
            .results
            .iter()
            .map(|r| r.risk_level)
            .max()
            .unwrap_or(RiskLevel::None);
        if highest != self.highest {
            self.highest = highest;
            Some(highest)
        } else {
            None
        }
    }

    pub fn results(&self) -> &[CollisionRiskResult] {
        &self.results
    }

    pub fn highest(&self) -> RiskLevel {
        self.highest
    }

    pub fn count_at(&self, level: RiskLevel) -> usize {
        self.results.iter().filter(|r| r.risk_level == level).count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
