//! Improvement detection over successive snapshots.
//!
//! The detector compares the per-type rollups of two [`EmpireSnapshot`]s
//! taken at different times. Snapshot retention between runs is the
//! caller's concern; the detector only ever sees the pair it is handed.
//! Nothing is persisted automatically: a proposed pattern waits for an
//! explicit operator confirmation, and at most one proposal per project
//! type is pending at a time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::{EmpireSnapshot, TypeMetrics};

/// Which per-type metric a detector tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedMetric {
    CompletionRate,
    RevenuePerUser,
    Revenue,
}

impl TrackedMetric {
    /// Human-readable name, used in pattern descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CompletionRate => "task completion rate",
            Self::RevenuePerUser => "revenue per user",
            Self::Revenue => "revenue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "completion_rate" => Some(Self::CompletionRate),
            "revenue_per_user" => Some(Self::RevenuePerUser),
            "revenue" => Some(Self::Revenue),
            _ => None,
        }
    }

    fn value(&self, metrics: &TypeMetrics) -> f64 {
        match self {
            Self::CompletionRate => metrics.completion_rate(),
            Self::RevenuePerUser => metrics.revenue_per_user(),
            Self::Revenue => metrics.revenue.as_dollars(),
        }
    }
}

/// Detector configuration.
#[derive(Debug, Clone, Copy)]
pub struct PatternConfig {
    /// Minimum relative improvement before a pattern is proposed, as a
    /// fraction (0.25 = +25%).
    pub threshold: f64,
    pub metric: TrackedMetric,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            metric: TrackedMetric::CompletionRate,
        }
    }
}

/// A proposed pattern awaiting operator confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct PendingPattern {
    pub project_type: String,
    pub metric: TrackedMetric,
    pub previous: f64,
    pub current: f64,
    /// Relative improvement, e.g. 0.25 for +25%.
    pub improvement: f64,
    pub description: String,
    pub detected_at: DateTime<Utc>,
}

/// A confirmed pattern. Terminal: nothing updates or deletes one.
#[derive(Debug, Clone, Serialize)]
pub struct Pattern {
    pub id: Uuid,
    pub project_type: String,
    pub metric: TrackedMetric,
    pub previous: f64,
    pub current: f64,
    pub improvement: f64,
    pub description: String,
    pub confirmed_at: DateTime<Utc>,
}

/// Outcome of resolving a pending pattern.
#[derive(Debug, Clone)]
pub enum Resolution {
    Persisted(Pattern),
    Discarded,
}

/// Flags per-type metric improvements between two snapshots.
#[derive(Debug, Default)]
pub struct PatternDetector {
    config: PatternConfig,
    pending: BTreeMap<String, PendingPattern>,
    persisted: Vec<Pattern>,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            persisted: Vec::new(),
        }
    }

    pub fn config(&self) -> PatternConfig {
        self.config
    }

    /// Proposals currently awaiting confirmation.
    pub fn pending(&self) -> Vec<PendingPattern> {
        self.pending.values().cloned().collect()
    }

    pub fn persisted(&self) -> &[Pattern] {
        &self.persisted
    }

    /// Compare two snapshots and refresh the pending set.
    ///
    /// Comparison is strictly per project type; a type missing from either
    /// snapshot is skipped, as is one with no baseline to improve on.
    /// Unconfirmed proposals from the prior cycle are superseded; persisted
    /// patterns are untouched.
    pub fn detect(
        &mut self,
        previous: &EmpireSnapshot,
        current: &EmpireSnapshot,
    ) -> Vec<PendingPattern> {
        self.pending.clear();

        for (project_type, current_metrics) in &current.by_type {
            let Some(previous_metrics) = previous.by_type.get(project_type) else {
                continue;
            };
            let before = self.config.metric.value(previous_metrics);
            let after = self.config.metric.value(current_metrics);
            if before <= 0.0 {
                continue;
            }

            let improvement = (after - before) / before;
            if improvement >= self.config.threshold {
                tracing::info!(
                    project_type = %project_type,
                    metric = self.config.metric.label(),
                    improvement,
                    "pattern detected, awaiting confirmation"
                );
                self.pending.insert(
                    project_type.clone(),
                    PendingPattern {
                        project_type: project_type.clone(),
                        metric: self.config.metric,
                        previous: before,
                        current: after,
                        improvement,
                        description: format!(
                            "{project_type}: {} {:+.0}%",
                            self.config.metric.label(),
                            improvement * 100.0
                        ),
                        detected_at: current.taken_at,
                    },
                );
            }
        }

        self.pending()
    }

    /// Resolve the pending proposal for a project type.
    ///
    /// `accept = true` persists it as a terminal [`Pattern`]; `accept =
    /// false` discards it. Either way the pending slot clears. Returns
    /// `None` when nothing is pending for the type.
    pub fn confirm(&mut self, project_type: &str, accept: bool) -> Option<Resolution> {
        let pending = self.pending.remove(project_type)?;
        if !accept {
            tracing::info!(project_type, "pattern discarded by operator");
            return Some(Resolution::Discarded);
        }

        let pattern = Pattern {
            id: Uuid::new_v4(),
            project_type: pending.project_type,
            metric: pending.metric,
            previous: pending.previous,
            current: pending.current,
            improvement: pending.improvement,
            description: pending.description,
            confirmed_at: Utc::now(),
        };
        tracing::info!(id = %pattern.id, description = %pattern.description, "pattern persisted");
        self.persisted.push(pattern.clone());
        Some(Resolution::Persisted(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Revenue;

    fn snapshot(types: &[(&str, TypeMetrics)]) -> EmpireSnapshot {
        let no_projects: Vec<crate::models::Project> = Vec::new();
        let mut snapshot = EmpireSnapshot::compute(&no_projects);
        for (name, metrics) in types {
            snapshot.by_type.insert(name.to_string(), *metrics);
        }
        snapshot
    }

    fn marketplace(tasks: usize, tasks_done: usize) -> TypeMetrics {
        TypeMetrics {
            projects: 2,
            revenue: Revenue::from_dollars(8500),
            users: 1200,
            tasks,
            tasks_done,
        }
    }

    #[test]
    fn flags_completion_rate_improvement_past_threshold() {
        let mut detector = PatternDetector::default();
        let previous = snapshot(&[("marketplace", marketplace(4, 1))]);
        let current = snapshot(&[("marketplace", marketplace(4, 2))]);

        let pending = detector.detect(&previous, &current);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].project_type, "marketplace");
        assert!((pending[0].improvement - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_improvement_below_threshold() {
        let mut detector = PatternDetector::default();
        let previous = snapshot(&[("marketplace", marketplace(10, 5))]);
        let current = snapshot(&[("marketplace", marketplace(10, 6))]);

        assert!(detector.detect(&previous, &current).is_empty());
    }

    #[test]
    fn skips_types_without_a_baseline() {
        let mut detector = PatternDetector::default();
        let previous = snapshot(&[("marketplace", marketplace(4, 0))]);
        let current = snapshot(&[("marketplace", marketplace(4, 4)), ("saas", marketplace(2, 2))]);

        // Zero baseline and a type absent from the previous snapshot both skip.
        assert!(detector.detect(&previous, &current).is_empty());
    }

    #[test]
    fn accepting_persists_a_terminal_pattern() {
        let mut detector = PatternDetector::default();
        let previous = snapshot(&[("marketplace", marketplace(4, 1))]);
        let current = snapshot(&[("marketplace", marketplace(4, 2))]);
        detector.detect(&previous, &current);

        let resolution = detector.confirm("marketplace", true);
        assert!(matches!(resolution, Some(Resolution::Persisted(_))));
        assert_eq!(detector.persisted().len(), 1);
        assert!(detector.pending().is_empty());
    }

    #[test]
    fn rejecting_clears_pending_without_persisting() {
        let mut detector = PatternDetector::default();
        let previous = snapshot(&[("marketplace", marketplace(4, 1))]);
        let current = snapshot(&[("marketplace", marketplace(4, 2))]);
        detector.detect(&previous, &current);

        let resolution = detector.confirm("marketplace", false);
        assert!(matches!(resolution, Some(Resolution::Discarded)));
        assert!(detector.persisted().is_empty());
        assert!(detector.pending().is_empty());
        assert!(detector.confirm("marketplace", true).is_none());
    }

    #[test]
    fn next_cycle_supersedes_unconfirmed_pending() {
        let mut detector = PatternDetector::default();
        let previous = snapshot(&[("marketplace", marketplace(4, 1))]);
        let current = snapshot(&[("marketplace", marketplace(4, 2))]);
        detector.detect(&previous, &current);
        assert_eq!(detector.pending().len(), 1);

        // No improvement this cycle: the stale proposal is gone.
        detector.detect(&current, &current);
        assert!(detector.pending().is_empty());
    }

    #[test]
    fn confirming_an_unknown_type_is_none() {
        let mut detector = PatternDetector::default();
        assert!(detector.confirm("saas", true).is_none());
    }
}
