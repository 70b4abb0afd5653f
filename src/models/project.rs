use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::manifest::Revenue;
use crate::models::Task;

/// A project, normalized from one manifest file.
///
/// Projects are the unit of aggregation. Each is born from a single JSON
/// manifest in the hub directory and owns its tasks outright. The store
/// guarantees `id` is unique within one load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Stable identifier: the manifest's explicit `id` field, or the file
    /// stem when none is given.
    pub id: String,
    pub name: String,
    /// Open-ended category ("SaaS", "marketplace", ...). Checked against the
    /// configured allow-list when one is present, otherwise any non-empty
    /// string is accepted.
    pub project_type: String,
    pub status: ProjectStatus,
    /// Canonical amount. Absent or malformed raw values degrade to zero with
    /// a recorded warning, never a rejection.
    pub revenue: Revenue,
    pub users: u64,
    pub tasks: Vec<Task>,
    /// Originating manifest file. Traceability only; the store never writes
    /// through this path.
    pub source_path: PathBuf,
}

/// The lifecycle status of a project.
///
/// The lifecycle is ordered but not monotonic: a production project may move
/// back to `Paused`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Development,
    Production,
    Paused,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Development => "development",
            Self::Production => "production",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }

    /// Case-insensitive parse; unrecognized values are rejected by the
    /// validator rather than coerced.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "planning" => Some(Self::Planning),
            "development" => Some(Self::Development),
            "production" => Some(Self::Production),
            "paused" => Some(Self::Paused),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Development and production projects count as active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Development | Self::Production)
    }
}
