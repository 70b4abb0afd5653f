//! The untyped manifest boundary.
//!
//! Manifests are hand-authored, so this module expects mess: camelCase keys
//! from the original dashboard tooling next to the short spellings, revenue
//! as anything from a bare number to `"$21K"`, tasks in either a flat array
//! or `active`/`completed` buckets. Raw values cross into typed
//! [`Project`](crate::models::Project)s only through [`ManifestValidator`],
//! and nothing downstream ever touches them again.

pub mod revenue;
pub mod validate;

pub use revenue::Revenue;
pub use validate::{ManifestValidator, ValidatorConfig};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a manifest file or field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ManifestError {
    /// The file is not well-formed JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// Well-formed content missing a required field or carrying a value
    /// outside its enumeration.
    #[error("schema violation: {0}")]
    Schema(String),

    /// A revenue value that could not be normalized. Non-fatal; the value
    /// degrades to zero.
    #[error("malformed revenue: {0}")]
    MalformedRevenue(String),

    /// Two files claim the same project id; the first discovered wins.
    #[error("duplicate project id: {0}")]
    DuplicateId(String),
}

/// A manifest as it appears on disk, before validation.
///
/// Field spellings follow the external contract with already-authored files:
/// both the short keys (`name`, `type`) and the original tooling's camelCase
/// (`projectName`, `projectType`) are accepted, and `revenue`/`users` may be
/// nested under a `metrics` object. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "projectName")]
    pub name: Option<String>,
    #[serde(default, rename = "type", alias = "projectType")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub revenue: Option<Value>,
    #[serde(default)]
    pub users: Option<Value>,
    #[serde(default)]
    pub metrics: Option<RawMetrics>,
    #[serde(default)]
    pub tasks: Option<RawTasks>,
}

/// The original tooling nests revenue and user counts under `metrics`.
/// Top-level fields win when both spellings appear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetrics {
    #[serde(default)]
    pub revenue: Option<Value>,
    #[serde(default)]
    pub users: Option<Value>,
}

/// Tasks appear either as a flat array or under the original
/// `{"active": [...], "completed": [...]}` buckets.
///
/// Elements stay as raw [`Value`]s so one malformed task is dropped on its
/// own instead of sinking the whole manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTasks {
    Flat(Vec<Value>),
    Buckets {
        #[serde(default)]
        active: Vec<Value>,
        #[serde(default)]
        completed: Vec<Value>,
    },
}

/// A single task record, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "assignedAgent",
        alias = "assigned_agent",
        alias = "agent"
    )]
    pub assigned_agent: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
