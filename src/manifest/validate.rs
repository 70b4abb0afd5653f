//! Schema validation: raw manifest in, typed [`Project`] out.

use std::path::Path;

use serde_json::Value;

use crate::models::{Project, ProjectStatus, Task, TaskPriority, TaskStatus};

use super::revenue::{self, Revenue};
use super::{ManifestError, RawManifest, RawTask, RawTasks};

/// Validator configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    /// Allowed project types, matched case-insensitively. `None` accepts any
    /// non-empty string; the taxonomy is open-ended by default.
    pub allowed_types: Option<Vec<String>>,
}

/// Converts untyped manifest content into [`Project`]s.
///
/// Validation either produces a project plus any degradation warnings, or
/// fails with a single schema error naming the offending field. Field-level
/// problems that can degrade safely (revenue, user counts, individual tasks)
/// become warnings instead of rejections.
#[derive(Debug, Clone, Default)]
pub struct ManifestValidator {
    config: ValidatorConfig,
}

impl ManifestValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate one parsed manifest. `source` is the originating file, used
    /// for the fallback id and kept on the project for traceability.
    pub fn validate(
        &self,
        raw: RawManifest,
        source: &Path,
    ) -> Result<(Project, Vec<ManifestError>), ManifestError> {
        let mut warnings = Vec::new();

        let name = required_string(raw.name, "name")?;
        let project_type = required_string(raw.project_type, "type")?;
        if let Some(allowed) = &self.config.allowed_types {
            if !allowed.iter().any(|t| t.eq_ignore_ascii_case(&project_type)) {
                return Err(ManifestError::Schema(format!(
                    "invalid type: {project_type}"
                )));
            }
        }

        let status_raw = required_string(raw.status, "status")?;
        let status = ProjectStatus::from_str(&status_raw)
            .ok_or_else(|| ManifestError::Schema(format!("invalid status: {status_raw}")))?;

        let id = match raw.id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(id) => id,
            None => source
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| ManifestError::Schema("missing field: id".to_string()))?,
        };

        // Top-level revenue/users win over the nested metrics spellings.
        let metrics = raw.metrics.unwrap_or_default();
        let revenue = match raw.revenue.or(metrics.revenue) {
            Some(value) => {
                let (revenue, warning) = revenue::parse_revenue(&value);
                warnings.extend(warning);
                revenue
            }
            None => Revenue::ZERO,
        };
        let users = coerce_users(raw.users.or(metrics.users), &mut warnings);

        let tasks = match raw.tasks {
            Some(tasks) => self.validate_tasks(tasks, &mut warnings),
            None => Vec::new(),
        };

        Ok((
            Project {
                id,
                name,
                project_type,
                status,
                revenue,
                users,
                tasks,
                source_path: source.to_path_buf(),
            },
            warnings,
        ))
    }

    fn validate_tasks(&self, raw: RawTasks, warnings: &mut Vec<ManifestError>) -> Vec<Task> {
        match raw {
            RawTasks::Flat(items) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| validate_task(v, i, None, warnings))
                .collect(),
            RawTasks::Buckets { active, completed } => {
                let mut tasks: Vec<Task> = active
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| validate_task(v, i, None, warnings))
                    .collect();
                // Completed-bucket tasks default to done rather than pending.
                let offset = active.len();
                tasks.extend(completed.iter().enumerate().filter_map(|(i, v)| {
                    validate_task(v, offset + i, Some(TaskStatus::Done), warnings)
                }));
                tasks
            }
        }
    }
}

/// Validate a single task record. A malformed task is dropped with a warning
/// scoped to its index; it never rejects the whole project.
fn validate_task(
    value: &Value,
    index: usize,
    implied_status: Option<TaskStatus>,
    warnings: &mut Vec<ManifestError>,
) -> Option<Task> {
    let raw: RawTask = match serde_json::from_value(value.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            warnings.push(ManifestError::Schema(format!("task {index}: {e}")));
            return None;
        }
    };

    let Some(description) = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
    else {
        warnings.push(ManifestError::Schema(format!(
            "task {index}: missing field: description"
        )));
        return None;
    };

    let priority = match raw.priority {
        Some(p) => match TaskPriority::from_str(&p) {
            Some(priority) => priority,
            None => {
                warnings.push(ManifestError::Schema(format!(
                    "task {index}: invalid priority: {p}"
                )));
                return None;
            }
        },
        None => TaskPriority::default(),
    };

    let status = match raw.status {
        Some(s) => match TaskStatus::from_str(&s) {
            Some(status) => status,
            None => {
                warnings.push(ManifestError::Schema(format!(
                    "task {index}: invalid status: {s}"
                )));
                return None;
            }
        },
        None => implied_status.unwrap_or_default(),
    };

    Some(Task {
        description,
        assigned_agent: raw.assigned_agent.filter(|a| !a.trim().is_empty()),
        priority,
        status,
    })
}

fn required_string(value: Option<String>, field: &str) -> Result<String, ManifestError> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ManifestError::Schema(format!("missing field: {field}")))
}

/// User counts coerce from numbers or numeric strings; anything else
/// degrades to zero with a warning.
fn coerce_users(value: Option<Value>, warnings: &mut Vec<ManifestError>) -> u64 {
    let Some(value) = value else { return 0 };
    let parsed = match &value {
        Value::Null => return 0,
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    match parsed {
        Some(users) => users,
        None => {
            warnings.push(ManifestError::Schema(format!("invalid users count: {value}")));
            0
        }
    }
}
