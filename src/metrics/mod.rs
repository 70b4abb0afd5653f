//! Empire-level aggregation.
//!
//! An [`EmpireSnapshot`] is computed from the full validated project set and
//! never mutated afterward; the next aggregation run supersedes it. All
//! counts are exact and revenue stays in integer cents, so results are
//! independent of file discovery order by construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::manifest::Revenue;
use crate::models::{Project, ProjectStatus, TaskPriority, TaskStatus};

/// Workload bucket for tasks with no assigned agent.
pub const UNASSIGNED: &str = "unassigned";

/// An immutable aggregate over one validated project set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpireSnapshot {
    pub taken_at: DateTime<Utc>,
    pub total_projects: usize,
    /// Projects in development or production.
    pub active_projects: usize,
    pub total_revenue: Revenue,
    pub status_distribution: BTreeMap<ProjectStatus, usize>,
    /// Open-task count per agent. Tasks with no agent land under
    /// [`UNASSIGNED`] rather than disappearing.
    pub agent_workload: BTreeMap<String, usize>,
    /// Every task counts here regardless of its status.
    pub task_priorities: BTreeMap<TaskPriority, usize>,
    /// Per-project-type rollup, keyed by the manifest `type` value.
    pub by_type: BTreeMap<String, TypeMetrics>,
}

/// Rollup for one project type; the input to pattern detection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TypeMetrics {
    pub projects: usize,
    pub revenue: Revenue,
    pub users: u64,
    pub tasks: usize,
    pub tasks_done: usize,
}

impl TypeMetrics {
    /// Fraction of tasks done; zero when the type has no tasks.
    pub fn completion_rate(&self) -> f64 {
        if self.tasks == 0 {
            0.0
        } else {
            self.tasks_done as f64 / self.tasks as f64
        }
    }

    /// Revenue in dollars per user; zero when there are no users.
    pub fn revenue_per_user(&self) -> f64 {
        if self.users == 0 {
            0.0
        } else {
            self.revenue.as_dollars() / self.users as f64
        }
    }
}

impl EmpireSnapshot {
    /// Aggregate a project set.
    ///
    /// Projects are folded in ascending-id order so output is reproducible
    /// for a fixed input set regardless of how the files were discovered.
    pub fn compute<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Self {
        let mut projects: Vec<&Project> = projects.into_iter().collect();
        projects.sort_by(|a, b| a.id.cmp(&b.id));

        let mut snapshot = EmpireSnapshot {
            taken_at: Utc::now(),
            total_projects: 0,
            active_projects: 0,
            total_revenue: Revenue::ZERO,
            status_distribution: BTreeMap::new(),
            agent_workload: BTreeMap::new(),
            task_priorities: BTreeMap::new(),
            by_type: BTreeMap::new(),
        };

        for project in projects {
            snapshot.total_projects += 1;
            if project.status.is_active() {
                snapshot.active_projects += 1;
            }
            snapshot.total_revenue += project.revenue;
            *snapshot
                .status_distribution
                .entry(project.status)
                .or_default() += 1;

            for task in &project.tasks {
                *snapshot.task_priorities.entry(task.priority).or_default() += 1;
                if task.status.is_open() {
                    let agent = task.assigned_agent.as_deref().unwrap_or(UNASSIGNED);
                    *snapshot.agent_workload.entry(agent.to_string()).or_default() += 1;
                }
            }

            let tasks_done = project
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Done)
                .count();
            let type_metrics = snapshot
                .by_type
                .entry(project.project_type.clone())
                .or_default();
            type_metrics.projects += 1;
            type_metrics.revenue += project.revenue;
            type_metrics.users += project.users;
            type_metrics.tasks += project.tasks.len();
            type_metrics.tasks_done += tasks_done;
        }

        snapshot
    }
}
